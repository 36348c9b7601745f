use serde::Serialize;

/// An airport with its fixed standard-time UTC offset. DST is not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Airport {
    pub code: &'static str,
    pub city: &'static str,
    pub utc_offset_minutes: i32,
}

const fn airport(code: &'static str, city: &'static str, utc_offset_minutes: i32) -> Airport {
    Airport { code, city, utc_offset_minutes }
}

static AIRPORTS: &[Airport] = &[
    // North America
    airport("TEB", "Teterboro", -300),
    airport("JFK", "New York", -300),
    airport("HPN", "White Plains", -300),
    airport("BOS", "Boston", -300),
    airport("IAD", "Washington", -300),
    airport("ATL", "Atlanta", -300),
    airport("MIA", "Miami", -300),
    airport("OPF", "Miami Opa-locka", -300),
    airport("PBI", "Palm Beach", -300),
    airport("YYZ", "Toronto", -300),
    airport("ORD", "Chicago", -360),
    airport("DFW", "Dallas", -360),
    airport("HOU", "Houston", -360),
    airport("MEX", "Mexico City", -360),
    airport("DEN", "Denver", -420),
    airport("ASE", "Aspen", -420),
    airport("LAX", "Los Angeles", -480),
    airport("VNY", "Van Nuys", -480),
    airport("SFO", "San Francisco", -480),
    airport("LAS", "Las Vegas", -480),
    airport("YVR", "Vancouver", -480),
    airport("HNL", "Honolulu", -600),
    // South America
    airport("GRU", "Sao Paulo", -180),
    airport("EZE", "Buenos Aires", -180),
    // Europe
    airport("LHR", "London Heathrow", 0),
    airport("LTN", "London Luton", 0),
    airport("FAB", "Farnborough", 0),
    airport("DUB", "Dublin", 0),
    airport("LIS", "Lisbon", 0),
    airport("CDG", "Paris", 60),
    airport("LBG", "Paris Le Bourget", 60),
    airport("NCE", "Nice", 60),
    airport("GVA", "Geneva", 60),
    airport("ZRH", "Zurich", 60),
    airport("FRA", "Frankfurt", 60),
    airport("MUC", "Munich", 60),
    airport("MAD", "Madrid", 60),
    airport("BCN", "Barcelona", 60),
    airport("FCO", "Rome", 60),
    airport("MXP", "Milan", 60),
    airport("AMS", "Amsterdam", 60),
    airport("VIE", "Vienna", 60),
    airport("ATH", "Athens", 120),
    airport("CAI", "Cairo", 120),
    airport("JNB", "Johannesburg", 120),
    airport("CPT", "Cape Town", 120),
    airport("IST", "Istanbul", 180),
    airport("SVO", "Moscow", 180),
    // Middle East
    airport("DOH", "Doha", 180),
    airport("RUH", "Riyadh", 180),
    airport("JED", "Jeddah", 180),
    airport("DXB", "Dubai", 240),
    airport("DWC", "Dubai World Central", 240),
    airport("AUH", "Abu Dhabi", 240),
    // Asia / Pacific
    airport("MLE", "Male", 300),
    airport("DEL", "Delhi", 330),
    airport("BOM", "Mumbai", 330),
    airport("KTM", "Kathmandu", 345),
    airport("BKK", "Bangkok", 420),
    airport("SIN", "Singapore", 480),
    airport("HKG", "Hong Kong", 480),
    airport("KUL", "Kuala Lumpur", 480),
    airport("PEK", "Beijing", 480),
    airport("PVG", "Shanghai", 480),
    airport("ICN", "Seoul", 540),
    airport("HND", "Tokyo Haneda", 540),
    airport("NRT", "Tokyo Narita", 540),
    airport("SYD", "Sydney", 600),
    airport("MEL", "Melbourne", 600),
    airport("AKL", "Auckland", 720),
];

/// Case-insensitive lookup by IATA code.
pub fn lookup_airport(code: &str) -> Option<&'static Airport> {
    let code = code.trim();
    AIRPORTS.iter().find(|a| a.code.eq_ignore_ascii_case(code))
}

pub fn all_airports() -> &'static [Airport] {
    AIRPORTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lhr = lookup_airport("lhr").expect("LHR in table");
        assert_eq!(lhr.utc_offset_minutes, 0);
        assert!(lookup_airport("XXX").is_none());
    }

    #[test]
    fn test_half_hour_offsets() {
        let del = lookup_airport("DEL").unwrap();
        assert_eq!(del.utc_offset_minutes, 330);
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<_> = all_airports().iter().map(|a| a.code).collect();
        codes.sort_unstable();
        let before = codes.len();
        codes.dedup();
        assert_eq!(before, codes.len());
    }
}
