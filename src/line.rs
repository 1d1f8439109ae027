use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

pub const DEFAULT_COLOR: &str = "#2ab76a";

// Separator between origin and destination in a line name
const NAME_SEPARATOR: &str = " → ";

/// Operating status of a line, as published by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    Delay,
    Suspended,
    // Unknown values fall back to normal, like the badge does
    #[default]
    #[serde(other)]
    Normal,
}

/// Display attributes for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub selectable: bool,
}

const NORMAL_STYLE: StatusStyle = StatusStyle {
    label: "Normal",
    description: "em operação normal",
    color: "#2ab76a",
    selectable: true,
};

const DELAY_STYLE: StatusStyle = StatusStyle {
    label: "Atraso",
    description: "com atraso",
    color: "#ff9500",
    selectable: true,
};

const SUSPENDED_STYLE: StatusStyle = StatusStyle {
    label: "Suspenso",
    description: "suspensa",
    color: "#ff3b5c",
    selectable: false,
};

impl LineStatus {
    pub const ALL: [LineStatus; 3] = [LineStatus::Normal, LineStatus::Delay, LineStatus::Suspended];

    pub fn style(self) -> &'static StatusStyle {
        match self {
            LineStatus::Normal => &NORMAL_STYLE,
            LineStatus::Delay => &DELAY_STYLE,
            LineStatus::Suspended => &SUSPENDED_STYLE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineStatus::Normal => "normal",
            LineStatus::Delay => "delay",
            LineStatus::Suspended => "suspended",
        }
    }
}

impl std::str::FromStr for LineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LineStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown status {s:?} (expected normal, delay or suspended)"))
    }
}

/// A map that keeps the declaration order of the source JSON object.
///
/// Period labels and fare segments are shown in the order the operator wrote
/// them, and "first period" is the fallback when no label matches today.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    // Later duplicates replace the value but keep the first position
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap(Vec::with_capacity(access.size_hint().unwrap_or(0)));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// One scheduled trip within a period.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DepartureRow {
    /// Departure from the origin, "HH:MM"
    #[serde(default)]
    pub de: Option<String>,
    /// Time at the intermediate stop, absent when the trip skips it
    #[serde(default)]
    pub colina: Option<String>,
    /// Arrival at the destination, "HH:MM"
    #[serde(default)]
    pub ate: Option<String>,
}

impl DepartureRow {
    pub fn new(de: Option<&str>, colina: Option<&str>, ate: Option<&str>) -> Self {
        Self {
            de: de.map(str::to_owned),
            colina: colina.map(str::to_owned),
            ate: ate.map(str::to_owned),
        }
    }

    /// Row with only a departure time, handy for timetables without stops.
    pub fn departing(de: &str) -> Self {
        Self::new(Some(de), None, None)
    }

    pub fn departure_minutes(&self) -> Option<u32> {
        crate::schedule::time_to_minutes(self.de.as_deref())
    }
}

/// One transit route as stored in the `bus_lines` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BusLine {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: LineStatus,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stops: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedules: OrderedMap<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule_detail: OrderedMap<Vec<DepartureRow>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prices: OrderedMap<f64>,
}

impl BusLine {
    pub fn new(id: impl Into<String>, number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            name: name.into(),
            color: None,
            status: LineStatus::Normal,
            frequency: None,
            stops: Vec::new(),
            schedules: OrderedMap::new(),
            schedule_detail: OrderedMap::new(),
            prices: OrderedMap::new(),
        }
    }

    pub fn with_status(mut self, status: LineStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_stops<S: Into<String>>(mut self, stops: impl IntoIterator<Item = S>) -> Self {
        self.stops = stops.into_iter().map(Into::into).collect();
        self
    }

    /// Add a period and its rows, registering the label in `schedules` too.
    pub fn with_period(mut self, label: &str, rows: Vec<DepartureRow>) -> Self {
        self.schedules.insert(label, serde_json::Value::Bool(true));
        self.schedule_detail.insert(label, rows);
        self
    }

    pub fn with_price(mut self, segment: &str, amount: f64) -> Self {
        self.prices.insert(segment, amount);
        self
    }

    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    /// Period labels, in declaration order.
    pub fn periods(&self) -> impl Iterator<Item = &str> {
        self.schedules.keys()
    }

    // A period missing from schedule_detail has no departures
    pub fn rows(&self, period: &str) -> &[DepartureRow] {
        self.schedule_detail.get(period).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn origin(&self) -> &str {
        self.name
            .split(NAME_SEPARATOR)
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("Origem")
    }

    pub fn destination(&self) -> &str {
        self.name.split(NAME_SEPARATOR).nth(1).unwrap_or("Destino")
    }

    pub fn intermediate_stops(&self) -> &[String] {
        if self.stops.len() < 2 {
            return &[];
        }
        &self.stops[1..self.stops.len() - 1]
    }

    /// Stop shown in the middle column of the timetable, if any.
    pub fn timed_stop(&self) -> Option<&str> {
        self.intermediate_stops().first().map(String::as_str)
    }

    pub fn is_selectable(&self) -> bool {
        self.status.style().selectable
    }

    // Format as "12 Jaborandi → Colina"
    pub fn format(&self) -> String {
        format!("{} {}", self.number, self.name)
    }
}

/// Format an amount the Brazilian way: "R$ 4,50".
pub fn format_price(amount: f64) -> String {
    format!("R$ {:.2}", amount).replace('.', ",")
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Ids come back as numbers from some table revisions and strings from others
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::invalid_type(
            de::Unexpected::Other(&other.to_string()),
            &"a string or a number",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_split() {
        let line = BusLine::new("1", "10", "Jaborandi → Colina");
        assert_eq!(line.origin(), "Jaborandi");
        assert_eq!(line.destination(), "Colina");

        let unnamed = BusLine::new("2", "11", "");
        assert_eq!(unnamed.origin(), "Origem");
        assert_eq!(unnamed.destination(), "Destino");
    }

    #[test]
    fn test_intermediate_stops() {
        let line = BusLine::new("1", "10", "A → C").with_stops(["A", "B", "B2", "C"]);
        assert_eq!(line.intermediate_stops(), &["B".to_string(), "B2".to_string()]);
        assert_eq!(line.timed_stop(), Some("B"));

        let direct = BusLine::new("2", "11", "A → C").with_stops(["A", "C"]);
        assert!(direct.intermediate_stops().is_empty());
        assert_eq!(direct.timed_stop(), None);

        let single = BusLine::new("3", "12", "A").with_stops(["A"]);
        assert!(single.intermediate_stops().is_empty());
    }

    #[test]
    fn test_ordered_map_keeps_first_position() {
        let mut map = OrderedMap::new();
        map.insert("b", 1);
        map.insert("a", 2);
        map.insert("b", 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&3));
    }

    #[test]
    fn test_status_table() {
        assert!(LineStatus::Normal.style().selectable);
        assert!(LineStatus::Delay.style().selectable);
        assert!(!LineStatus::Suspended.style().selectable);
        assert_eq!(LineStatus::Delay.style().label, "Atraso");
        assert_eq!("Suspended".parse::<LineStatus>(), Ok(LineStatus::Suspended));
        assert!("closed".parse::<LineStatus>().is_err());
    }

    #[test]
    fn test_status_decodes_unknown_as_normal() {
        let decode = |json: &str| serde_json::from_str::<LineStatus>(json).unwrap();
        assert_eq!(decode(r#""delay""#), LineStatus::Delay);
        assert_eq!(decode(r#""suspended""#), LineStatus::Suspended);
        assert_eq!(decode(r#""weird""#), LineStatus::Normal);

        let line: BusLine = serde_json::from_str(r#"{"id": 1, "status": null}"#).unwrap();
        assert_eq!(line.status, LineStatus::Normal);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(4.5), "R$ 4,50");
        assert_eq!(format_price(12.0), "R$ 12,00");
    }

    #[test]
    fn test_missing_period_has_no_rows() {
        let line = BusLine::new("1", "10", "A → B").with_period("Seg–Sex", vec![DepartureRow::departing("06:00")]);
        assert_eq!(line.rows("Seg–Sex").len(), 1);
        assert!(line.rows("Domingo").is_empty());
    }
}
