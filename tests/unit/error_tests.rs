use besto::AppError;

#[test]
fn display_prefixes_each_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Db("locked".into()), "db: locked"),
        (AppError::NotFound("task 1".into()), "not found: task 1"),
        (AppError::InvalidInput("empty".into()), "invalid input: empty"),
        (AppError::InvalidState("busy".into()), "invalid state: busy"),
        (
            AppError::QuotaExhausted("chat needs 25 tokens".into()),
            "quota exhausted: chat needs 25 tokens",
        ),
        (
            AppError::EngineUnavailable("no mic".into()),
            "engine unavailable: no mic",
        ),
        (
            AppError::ExternalService("503".into()),
            "external service: 503",
        ),
        (
            AppError::MalformedData("not json".into()),
            "malformed data: not json",
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn json_errors_become_malformed_data() {
    let err = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
    let app: AppError = err.into();
    assert!(matches!(app, AppError::MalformedData(_)));
}

#[test]
fn toml_errors_become_config() {
    let err = toml::from_str::<toml::Value>("a = [").expect_err("invalid toml");
    let app: AppError = err.into();
    assert!(matches!(app, AppError::Config(msg) if msg.starts_with("invalid config")));
}
