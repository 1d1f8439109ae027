use crate::line::{BusLine, LineStatus};

/// Status chip on the lines page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(LineStatus),
}

impl StatusFilter {
    pub const CHIPS: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Only(LineStatus::Normal),
        StatusFilter::Only(LineStatus::Delay),
        StatusFilter::Only(LineStatus::Suspended),
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "Todas",
            StatusFilter::Only(LineStatus::Normal) => "Em operação",
            StatusFilter::Only(LineStatus::Delay) => "Com atraso",
            StatusFilter::Only(LineStatus::Suspended) => "Suspensas",
        }
    }

    pub fn accepts(self, status: LineStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFilter {
    pub status: StatusFilter,
    pub search: String,
}

impl LineFilter {
    pub fn new(status: StatusFilter, search: impl Into<String>) -> Self {
        Self {
            status,
            search: search.into(),
        }
    }

    // Search matches the line number or the name, ignoring case
    pub fn matches(&self, line: &BusLine) -> bool {
        if !self.status.accepts(line.status) {
            return false;
        }
        let query = self.search.trim().to_lowercase();
        query.is_empty()
            || line.number.to_lowercase().contains(&query)
            || line.name.to_lowercase().contains(&query)
    }

    pub fn apply<'a>(&self, lines: &'a [BusLine]) -> Vec<&'a BusLine> {
        lines.iter().filter(|line| self.matches(line)).collect()
    }
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 linha encontrada".to_string()
    } else {
        format!("{} linhas encontradas", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<BusLine> {
        vec![
            BusLine::new("1", "101", "Jaborandi → Colina"),
            BusLine::new("2", "102", "Jaborandi → Barretos").with_status(LineStatus::Delay),
            BusLine::new("3", "203", "Colina → Bebedouro").with_status(LineStatus::Suspended),
        ]
    }

    #[test]
    fn test_search_by_number_and_name() {
        let lines = lines();
        let by_number = LineFilter::new(StatusFilter::All, "10").apply(&lines);
        assert_eq!(by_number.len(), 2);

        let by_name = LineFilter::new(StatusFilter::All, "COLINA").apply(&lines);
        assert_eq!(by_name.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["1", "3"]);
    }

    #[test]
    fn test_status_filter() {
        let lines = lines();
        let delayed = LineFilter::new(StatusFilter::Only(LineStatus::Delay), "").apply(&lines);
        assert_eq!(delayed.len(), 1);
        assert_eq!(delayed[0].id, "2");

        let none = LineFilter::new(StatusFilter::Only(LineStatus::Suspended), "barretos").apply(&lines);
        assert!(none.is_empty());
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(1), "1 linha encontrada");
        assert_eq!(count_label(0), "0 linhas encontradas");
        assert_eq!(count_label(3), "3 linhas encontradas");
    }
}
