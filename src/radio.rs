//! Radio favorites persistence: one record per line, `:::`-delimited.
//!
//! Grounded on spec.md §6: `name:::url_resolved:::country:::codec:::bitrate:::votes`,
//! with any field containing the delimiter sanitised before write so a
//! write-then-read round trip can't desync field boundaries.

const DELIMITER: &str = ":::";
const FIELD_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RadioStation {
    pub name: String,
    pub url_resolved: String,
    pub country: String,
    pub codec: String,
    pub bitrate: String,
    pub votes: String,
}

/// Replaces any occurrence of the field delimiter within a field with a
/// single colon, so a station whose name happens to contain `:::` can't
/// inject a spurious field boundary on the next read.
fn sanitise_field(field: &str) -> String {
    field.replace(DELIMITER, ":")
}

pub fn parse(data: &str) -> Vec<RadioStation> {
    let mut stations = Vec::new();
    for line in data.lines() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.splitn(FIELD_COUNT, DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            continue;
        }
        stations.push(RadioStation {
            name: fields[0].to_string(),
            url_resolved: fields[1].to_string(),
            country: fields[2].to_string(),
            codec: fields[3].to_string(),
            bitrate: fields[4].to_string(),
            votes: fields[5].to_string(),
        });
    }
    stations
}

pub fn write(stations: &[RadioStation]) -> String {
    let mut out = String::new();
    for station in stations {
        out.push_str(&sanitise_field(&station.name));
        out.push_str(DELIMITER);
        out.push_str(&sanitise_field(&station.url_resolved));
        out.push_str(DELIMITER);
        out.push_str(&sanitise_field(&station.country));
        out.push_str(DELIMITER);
        out.push_str(&sanitise_field(&station.codec));
        out.push_str(DELIMITER);
        out.push_str(&sanitise_field(&station.bitrate));
        out.push_str(DELIMITER);
        out.push_str(&sanitise_field(&station.votes));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RadioStation {
        RadioStation {
            name: "Example FM".into(),
            url_resolved: "https://example.invalid/stream".into(),
            country: "Testland".into(),
            codec: "MP3".into(),
            bitrate: "128".into(),
            votes: "42".into(),
        }
    }

    #[test]
    fn round_trip_preserves_fields() {
        let stations = vec![sample()];
        let text = write(&stations);
        let parsed = parse(&text);
        assert_eq!(parsed, stations);
    }

    #[test]
    fn delimiter_in_field_is_sanitised_before_write() {
        let mut station = sample();
        station.name = "Weird:::Name".into();
        let text = write(&[station]);
        let parsed = parse(&text);
        assert_eq!(parsed.len(), 1);
        assert!(!parsed[0].name.contains(DELIMITER));
    }

    #[test]
    fn malformed_line_is_skipped() {
        let parsed = parse("not:::enough:::fields\n");
        assert!(parsed.is_empty());
    }
}
