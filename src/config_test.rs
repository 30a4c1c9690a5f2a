use rand::prelude::random;

use std::{env, fs, time};

use super::*;

fn write_config(text: &str) -> path::PathBuf {
    let loc = env::temp_dir().join(format!("mqfvt-config-{}.toml", random::<u64>()));
    fs::write(&loc, text).unwrap();
    loc
}

#[test]
fn test_config_default() {
    let config = Config::default();
    config.validate().unwrap();

    assert_eq!(config.name(), "mqfvt");
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.port(), 1883);
    assert_eq!(config.protocol().unwrap(), MqttProtocol::V311);
    assert_eq!(config.connect_timeout(), time::Duration::from_millis(5000));
    assert_eq!(config.read_timeout(), time::Duration::from_millis(1000));
    assert_eq!(config.eof_retry_delay(), time::Duration::from_secs(10));
    assert_eq!(config.keep_alive(), 60);
    assert_eq!(config.max_packet_size(), 268_435_460);
    assert_eq!(config.address().unwrap(), "127.0.0.1:1883".parse().unwrap());

    // fresh client-id on every call, unless configured.
    assert_ne!(config.client_id(), config.client_id());
}

#[test]
fn test_config_from_file() {
    let loc = write_config(
        r#"
        name = "v5-session"
        port = 1884
        protocol = 5
        client_id = "fvt-client"
        read_timeout = 250
        "#,
    );

    let config = Config::from_file(&loc).unwrap();
    fs::remove_file(&loc).ok();

    assert_eq!(config.name(), "v5-session");
    assert_eq!(config.port(), 1884);
    assert_eq!(config.protocol().unwrap(), MqttProtocol::V5);
    assert_eq!(config.client_id(), ClientID::from("fvt-client"));
    assert_eq!(config.read_timeout(), time::Duration::from_millis(250));
    // missing fields fall back to defaults.
    assert_eq!(config.host(), Config::DEF_HOST);
    assert_eq!(config.keep_alive(), Config::DEF_KEEP_ALIVE);
    assert_eq!(config.connect_timeout(), time::Duration::from_millis(5000));
}

#[test]
fn test_config_invalid() {
    let refs: Vec<(&str, ErrorKind)> = vec![
        ("protocol = 6", ErrorKind::InvalidInput),
        ("port = 0", ErrorKind::InvalidInput),
        ("read_timeout = 0", ErrorKind::InvalidInput),
        ("connect_timeout = 0", ErrorKind::InvalidInput),
        ("max_packet_size = 268435461", ErrorKind::InvalidInput),
        ("port = \"abc\"", ErrorKind::FailConvert),
        ("port = ", ErrorKind::FailConvert),
    ];

    for (text, kind) in refs.into_iter() {
        let loc = write_config(text);
        let res = Config::from_file(&loc);
        fs::remove_file(&loc).ok();
        match res {
            Ok(_) => panic!("{:?} accepted", text),
            Err(err) => assert_eq!(err.kind(), kind, "{:?} {}", text, err),
        }
    }

    let err = Config::from_file("/nonexistent/mqfvt.toml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IOError);

    let config = Config { protocol: Some(6), ..Config::default() };
    let err = config.protocol().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.has(ErrorKind::UnsupportedProtocolVersion));
}
