//! Serde adapters for fields without native serde support.

/// `Regex` as its pattern string.
pub(crate) mod regex_str {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(re: &Regex, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(re.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Regex, D::Error> {
        let pattern = String::deserialize(d)?;
        Regex::new(&pattern).map_err(serde::de::Error::custom)
    }
}

/// `Vec<Regex>` as a list of pattern strings.
pub(crate) mod regex_vec {
    use regex::Regex;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(res: &[Regex], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(res.len()))?;
        for re in res {
            seq.serialize_element(re.as_str())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Regex>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|p| Regex::new(p).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
