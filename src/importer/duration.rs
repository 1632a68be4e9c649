/// Convert an ISO 8601 duration to human-readable format,
/// e.g. `PT30M` -> `30 minutes`, `PT1H30M` -> `1 hour 30 minutes`,
/// `PT5400.0S` -> `1 hour 30 minutes`.
///
/// Anything that is not a plain time duration (ranges, day components,
/// free text) is returned unchanged.
pub fn convert_duration(duration: &str) -> String {
    let Some(body) = duration.strip_prefix("PT") else {
        return duration.to_string();
    };
    if body.is_empty() {
        return duration.to_string();
    }

    let mut total_seconds = 0.0_f64;
    let mut number = String::new();

    for c in body.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' | 'M' | 'S' => {
                let Ok(value) = number.parse::<f64>() else {
                    return duration.to_string();
                };
                total_seconds += value
                    * match c {
                        'H' => 3600.0,
                        'M' => 60.0,
                        _ => 1.0,
                    };
                number.clear();
            }
            _ => return duration.to_string(),
        }
    }

    // trailing digits without a unit
    if !number.is_empty() {
        return duration.to_string();
    }

    let total_minutes = (total_seconds / 60.0).round() as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    match (hours, minutes) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}

fn plural(count: u64, unit: &str) -> String {
    format!("{} {}{}", count, unit, if count == 1 { "" } else { "s" })
}
