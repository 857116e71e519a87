#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_di::Settings;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // First line is the lookup path, the rest the settings source
    let (path, source) = text.split_once('\n').unwrap_or((text, "{}"));
    if let Ok(settings) = Settings::from_json_str(source) {
        let _ = settings.get(path);
        let merged = settings.clone().merge(settings);
        let _ = merged.get_as::<String>(path);
    }

    let vars = text
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()));
    let settings = Settings::from_vars("FUZZ", vars);
    let _ = settings.get(path);
});
