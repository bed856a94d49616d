use super::*;

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./.").is_err());
}

#[test]
fn variants_get_their_own_keys() {
    assert_eq!(template_key("news", None), "news");
    assert_eq!(template_key("idea", Some(3)), "idea_3");

    let mut reg = TemplateRegistry::default();
    reg.register("idea", Some(3), "templates/idea-apr.png").unwrap();
    reg.register("idea", None, "templates/idea.png").unwrap();

    assert_eq!(reg.resolve("idea", Some(3)).unwrap(), "templates/idea-apr.png");
    assert_eq!(reg.resolve("idea", None).unwrap(), "templates/idea.png");
}

#[test]
fn unregistered_asset_is_not_found() {
    let reg = TemplateRegistry::default();
    let err = reg.resolve("news", Some(1)).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("news_1"));
}

#[test]
fn from_map_rejects_traversal() {
    let mut map = BTreeMap::new();
    map.insert("news".to_string(), "../secret.png".to_string());
    assert!(TemplateRegistry::from_map(&map).is_err());
}
