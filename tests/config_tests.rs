// Tests for startup configuration validation

use anyhow::Result;
use voice_call_tracker::config::{DEFAULT_API_BASE, DEFAULT_GATEWAY_URL};
use voice_call_tracker::{Config, RenderMode};

fn settings(pairs: &[(&str, &str)]) -> Result<config::Config> {
    let mut builder = config::Config::builder();
    for (key, value) in pairs {
        builder = builder.set_override(*key, *value)?;
    }
    Ok(builder.build()?)
}

#[test]
fn test_minimal_config_uses_defaults() -> Result<()> {
    let cfg = Config::from_settings(settings(&[
        ("bot_token", "secret-token"),
        ("log_channel_id", "1234567890"),
    ])?)?;

    assert_eq!(cfg.bot_token, "secret-token");
    assert_eq!(cfg.log_channel_id, "1234567890");
    assert!(cfg.log_embeds);
    assert_eq!(cfg.render_mode(), RenderMode::Rich);
    assert_eq!(cfg.api_base, DEFAULT_API_BASE);
    assert_eq!(cfg.gateway_url, DEFAULT_GATEWAY_URL);
    assert_eq!(cfg.status_bind, None);
    assert!(!cfg.log_json);
    Ok(())
}

#[test]
fn test_missing_token_is_rejected() -> Result<()> {
    let err = Config::from_settings(settings(&[("log_channel_id", "1")])?).unwrap_err();
    assert!(err.to_string().contains("BOT_TOKEN and LOG_CHANNEL_ID must be set"));
    Ok(())
}

#[test]
fn test_missing_or_blank_channel_is_rejected() -> Result<()> {
    assert!(Config::from_settings(settings(&[("bot_token", "t")])?).is_err());
    assert!(Config::from_settings(settings(&[("bot_token", "t"), ("log_channel_id", "  ")])?).is_err());
    Ok(())
}

#[test]
fn test_log_embeds_toggle() -> Result<()> {
    for (value, expected) in [
        ("true", true),
        ("TRUE", true),
        ("1", true),
        ("false", false),
        ("no", false),
        ("anything", false),
    ] {
        let cfg = Config::from_settings(settings(&[
            ("bot_token", "t"),
            ("log_channel_id", "1"),
            ("log_embeds", value),
        ])?)?;
        assert_eq!(cfg.log_embeds, expected, "LOG_EMBEDS={}", value);
    }
    Ok(())
}

#[test]
fn test_optional_overrides() -> Result<()> {
    let cfg = Config::from_settings(settings(&[
        ("bot_token", "t"),
        ("log_channel_id", "1"),
        ("discord_api_base", "http://127.0.0.1:9000/api/"),
        ("status_bind", "127.0.0.1:8080"),
        ("log_json", "true"),
    ])?)?;

    assert_eq!(cfg.api_base, "http://127.0.0.1:9000/api");
    assert_eq!(cfg.status_bind.as_deref(), Some("127.0.0.1:8080"));
    assert!(cfg.log_json);
    Ok(())
}

#[test]
fn test_debug_redacts_token() -> Result<()> {
    let cfg = Config::from_settings(settings(&[
        ("bot_token", "super-secret"),
        ("log_channel_id", "1"),
    ])?)?;

    let printed = format!("{:?}", cfg);
    assert!(!printed.contains("super-secret"));
    assert!(printed.contains("<redacted>"));
    Ok(())
}
