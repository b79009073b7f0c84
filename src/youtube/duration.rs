//! ISO-8601 duration handling for the shapes the video API emits
//! (`PT4M13S`, `PT1H2M3S`, `P1DT1H` and so on).

/// Renders an ISO-8601 duration as `H:MM:SS`, or `M:SS` when there is no
/// hour component. The zero-duration sentinel (`PT0S`, used for live
/// streams and premieres) yields `None`, as does anything malformed.
pub fn format_duration(iso: &str) -> Option<String> {
    let total = parse_seconds(iso)?;
    if total == 0 {
        return None;
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        Some(format!("{}:{:02}:{:02}", hours, minutes, seconds))
    } else {
        Some(format!("{}:{:02}", minutes, seconds))
    }
}

/// Total seconds in an ISO-8601 duration. Days are accepted before the time
/// section; calendar units (years, months, weeks) are not.
pub(crate) fn parse_seconds(iso: &str) -> Option<i64> {
    let rest = iso.strip_prefix('P')?;

    let mut total: i64 = 0;
    let mut current = String::new();
    let mut in_time = false;

    for c in rest.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if c == 'T' {
            if !current.is_empty() {
                return None;
            }
            in_time = true;
        } else {
            let value: i64 = current.parse().ok()?;
            match (in_time, c) {
                (false, 'D') => total += value * 86_400,
                (true, 'H') => total += value * 3600,
                (true, 'M') => total += value * 60,
                (true, 'S') => total += value,
                _ => return None,
            }
            current.clear();
        }
    }

    if !current.is_empty() {
        return None;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration("PT4M13S").as_deref(), Some("4:13"));
        assert_eq!(format_duration("PT58S").as_deref(), Some("0:58"));
        assert_eq!(format_duration("PT10M").as_deref(), Some("10:00"));
    }

    #[test]
    fn formats_hours_with_padded_components() {
        assert_eq!(format_duration("PT1H2M3S").as_deref(), Some("1:02:03"));
        assert_eq!(format_duration("PT2H").as_deref(), Some("2:00:00"));
        assert_eq!(format_duration("P1DT1H").as_deref(), Some("25:00:00"));
    }

    #[test]
    fn zero_duration_is_absent() {
        assert_eq!(format_duration("PT0S"), None);
        assert_eq!(format_duration("PT"), None);
    }

    #[test]
    fn malformed_input_is_absent() {
        assert_eq!(format_duration(""), None);
        assert_eq!(format_duration("4M13S"), None);
        assert_eq!(format_duration("PTM"), None);
        assert_eq!(format_duration("PT4X"), None);
        assert_eq!(format_duration("P1W"), None);
        assert_eq!(format_duration("PT1H30"), None);
    }

    #[test]
    fn parse_seconds_sums_every_component() {
        assert_eq!(parse_seconds("PT4M13S"), Some(253));
        assert_eq!(parse_seconds("PT1H2M3S"), Some(3723));
        assert_eq!(parse_seconds("P1DT1H"), Some(90_000));
        assert_eq!(parse_seconds("PT45S"), Some(45));
        assert_eq!(parse_seconds("PT0S"), Some(0));
    }
}
