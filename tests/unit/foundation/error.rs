use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(OgError::not_found("x").to_string().contains("not found:"));
    assert!(
        OgError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(OgError::upstream("x").to_string().contains("upstream failure:"));
    assert!(OgError::load("x").to_string().contains("load failure:"));
    assert!(
        OgError::unsupported_type("x")
            .to_string()
            .contains("unsupported content type:")
    );
    assert!(
        OgError::persistence("x")
            .to_string()
            .contains("persistence failure:")
    );
    assert!(OgError::validation("x").to_string().contains("validation error:"));
    assert!(OgError::serde("x").to_string().contains("serialization error:"));
}

#[test]
fn save_order_violations_have_fixed_messages() {
    assert!(OgError::NotRendered.to_string().contains("render()"));
    assert!(OgError::NoImage.to_string().contains("no image"));
}

#[test]
fn only_not_found_maps_to_not_found() {
    assert!(OgError::not_found("news 'x'").is_not_found());
    assert!(!OgError::load("x").is_not_found());
    assert!(!OgError::NotRendered.is_not_found());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = OgError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
