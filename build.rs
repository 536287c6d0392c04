fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=dashboard.local.rs");
    emit_local_settings_from_dashboard_local();
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}

/// Constants in `dashboard.local.rs` and the env var each one becomes.
const LOCAL_SETTINGS: [(&str, &str); 6] = [
    ("WIFI_SSID", "LOCAL_WIFI_SSID"),
    ("WIFI_PASS", "LOCAL_WIFI_PASS"),
    ("STATUS_HOST", "LOCAL_STATUS_HOST"),
    ("STATUS_PORT", "LOCAL_STATUS_PORT"),
    ("UTC_OFFSET_SECONDS", "LOCAL_UTC_OFFSET"),
    ("DEBUG", "LOCAL_DEBUG"),
];

fn emit_local_settings_from_dashboard_local() {
    let path = std::path::Path::new("dashboard.local.rs");
    let Ok(src) = std::fs::read_to_string(path) else {
        return;
    };

    for (name, env) in LOCAL_SETTINGS {
        if let Some(v) = extract_rust_str_const(&src, name) {
            println!("cargo:rustc-env={}={}", env, v);
        }
    }
}

fn extract_rust_str_const(src: &str, name: &str) -> Option<String> {
    for line in src.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") {
            continue;
        }
        let needle = format!("pub const {}:", name);
        if !trimmed.starts_with(&needle) {
            continue;
        }
        let start = trimmed.find('"')?;
        let end = trimmed[start + 1..].find('"')? + start + 1;
        return Some(trimmed[start + 1..end].to_string());
    }
    None
}
