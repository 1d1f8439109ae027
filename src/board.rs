//! Plain-text rendering of lines, timetables, stops and fares.
//!
//! Nothing here decides anything: the timetable state comes in already
//! resolved as a [`DepartureBoard`].

use crate::app::View;
use crate::filter;
use crate::line::{format_price, BusLine};
use crate::schedule::{self, DepartureBoard, RowState};
use crate::theme::Palette;
use std::fmt::Write;

pub const NO_LINE: &str = "Nenhuma linha disponível.";
pub const NO_LINES_FOUND: &str = "Nenhuma linha encontrada.";
pub const NO_SERVICE: &str = "Sem operação neste dia";
pub const ALL_DEPARTED: &str = "Sem mais horários hoje para esta linha.";
pub const NO_ROUTE_INFO: &str = "Informações de trajeto não disponíveis.";
pub const FETCH_FAILED: &str = "Sem conexão\nNão foi possível carregar os horários.";
pub const NEXT_MARKER: &str = "Próximo";

const ABOUT_TEXT: &str = "Horários intermunicipais de ônibus de Jaborandi – SP, \
com as linhas da Rápido do Oeste.";

// Placeholder for trips that skip the intermediate stop
const SKIPPED_STOP: &str = "· · · · ·";
const COLUMN_WIDTH: usize = 16;

pub fn line_card(line: &BusLine, palette: &Palette) -> String {
    let style = line.status.style();
    let mut out = String::new();
    let dim = if line.is_selectable() { "" } else { palette.past };
    let _ = write!(
        out,
        "{dim}{bold}{:>4}{reset}{dim} {}  [{}]{reset}",
        line.number,
        line.name,
        style.label,
        bold = palette.emphasis,
        reset = palette.reset,
    );
    if let Some(frequency) = line.frequency.as_deref().filter(|f| !f.is_empty()) {
        let _ = write!(out, "\n     {}{}{}", palette.muted, frequency, palette.reset);
    }
    out
}

pub fn line_list(lines: &[&BusLine], palette: &Palette) -> String {
    if lines.is_empty() {
        return format!("{}\n", NO_LINES_FOUND);
    }
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(out, "{}", line_card(line, palette));
    }
    let _ = writeln!(out, "\n{}", filter::count_label(lines.len()));
    out
}

/// Page heading followed by its body.
pub fn page(view: View, body: &str) -> String {
    format!("{}\n\n{}", view.title(), body)
}

pub fn about(palette: &Palette) -> String {
    format!(
        "{bold}JaborandiTransp{reset} {}\n\n{}\n",
        env!("CARGO_PKG_VERSION"),
        ABOUT_TEXT,
        bold = palette.emphasis,
        reset = palette.reset,
    )
}

/// Period buttons in display order, the active one bracketed.
pub fn period_bar(line: &BusLine, active: Option<&str>) -> String {
    schedule::order_periods(line.periods())
        .into_iter()
        .map(|label| {
            if Some(label) == active {
                format!("[{}]", label)
            } else {
                format!(" {} ", label)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn header(line: &BusLine) -> String {
    let middle = match line.timed_stop() {
        Some(stop) => format!("Passa em {}", stop),
        None => "Trajeto direto".to_string(),
    };
    format!(
        "{:<w$}{:<w$}{}",
        format!("Parte de {}", line.origin()),
        middle,
        format!("Chega em {}", line.destination()),
        w = COLUMN_WIDTH + 8,
    )
}

pub fn timetable(line: &BusLine, board: &DepartureBoard<'_>, palette: &Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}{}", palette.emphasis, header(line), palette.reset);

    match board {
        DepartureBoard::NoService => {
            let _ = writeln!(out, "{}", NO_SERVICE);
            return out;
        }
        DepartureBoard::AllDeparted(_) => {
            let _ = writeln!(out, "{}{}{}", palette.muted, ALL_DEPARTED, palette.reset);
        }
        DepartureBoard::Upcoming { .. } => {}
    }

    for (row, state) in board.states() {
        let de = row.de.as_deref().unwrap_or("--:--");
        let colina = row.colina.as_deref().unwrap_or(SKIPPED_STOP);
        let ate = row.ate.as_deref().unwrap_or("--:--");
        let cells = format!("{:<w$}{:<w$}{}", de, colina, ate, w = COLUMN_WIDTH + 8);
        let _ = match state {
            RowState::Past => writeln!(out, "  {}{}{}", palette.past, cells, palette.reset),
            RowState::Next => writeln!(
                out,
                "> {}{}  {}{}",
                palette.emphasis, cells, NEXT_MARKER, palette.reset
            ),
            RowState::Upcoming => writeln!(out, "  {}{}{}", palette.text, cells, palette.reset),
        };
    }
    out
}

pub fn stops(line: &BusLine, palette: &Palette) -> String {
    if line.stops.is_empty() {
        return format!("{}\n", NO_ROUTE_INFO);
    }
    let mut out = String::new();
    let _ = writeln!(out, "Trajeto · {} paradas", line.stops.len());
    let last = line.stops.len() - 1;
    for (i, stop) in line.stops.iter().enumerate() {
        if i == 0 || i == last {
            let _ = writeln!(out, "  ● {}{}{}", palette.emphasis, stop, palette.reset);
        } else {
            let _ = writeln!(out, "  ○ {}{}{}", palette.muted, stop, palette.reset);
        }
    }
    out
}

pub fn prices(line: &BusLine, palette: &Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Valor das passagens");
    if line.prices.is_empty() {
        let _ = writeln!(out, "  {}—{}", palette.muted, palette.reset);
        return out;
    }
    for (segment, amount) in line.prices.iter() {
        let _ = writeln!(
            out,
            "  {:<30}{}{}{}",
            segment,
            palette.emphasis,
            format_price(*amount),
            palette.reset
        );
    }
    out
}

/// Full timetable page for one line.
pub fn schedule_page(line: &BusLine, period: Option<&str>, board: &DepartureBoard<'_>, palette: &Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", line_card(line, palette));
    let intermediate = line.intermediate_stops();
    if !intermediate.is_empty() {
        let _ = writeln!(out, "     Passa por {}", intermediate.join(", "));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", period_bar(line, period));
    let _ = writeln!(out);
    out.push_str(&timetable(line, board, palette));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::DepartureRow;

    fn line() -> BusLine {
        BusLine::new("1", "101", "Jaborandi → Colina")
            .with_stops(["Jaborandi", "Vila Nova", "Colina"])
            .with_period(
                "Seg–Sex",
                vec![
                    DepartureRow::new(Some("06:00"), Some("06:20"), Some("06:45")),
                    DepartureRow::new(Some("12:00"), None, Some("12:40")),
                ],
            )
            .with_period("Domingo", Vec::new())
    }

    #[test]
    fn test_timetable_marks_next_row() {
        let line = line();
        let board = DepartureBoard::resolve(line.rows("Seg–Sex"), 420);
        let text = timetable(&line, &board, &Palette::PLAIN);
        let next_line = text.lines().find(|l| l.starts_with('>')).unwrap();
        assert!(next_line.contains("12:00"));
        assert!(next_line.contains(NEXT_MARKER));
        assert!(text.contains(SKIPPED_STOP));
        assert!(text.contains("Passa em Vila Nova"));
        assert!(!text.contains(ALL_DEPARTED));
    }

    #[test]
    fn test_empty_states_are_distinct() {
        let line = line();
        let none = timetable(&line, &DepartureBoard::resolve(line.rows("Domingo"), 420), &Palette::PLAIN);
        assert!(none.contains(NO_SERVICE));
        assert!(!none.contains(ALL_DEPARTED));

        let gone = timetable(&line, &DepartureBoard::resolve(line.rows("Seg–Sex"), 1000), &Palette::PLAIN);
        assert!(gone.contains(ALL_DEPARTED));
        assert!(!gone.contains(NO_SERVICE));
        assert!(gone.contains("06:00"));
    }

    #[test]
    fn test_pages_carry_their_title() {
        let home = page(View::Home, &line_list(&[&line()], &Palette::PLAIN));
        assert!(home.starts_with("Início\n\n"));
        assert!(home.contains("1 linha encontrada"));

        let about = page(View::About, &about(&Palette::PLAIN));
        assert!(about.starts_with("Sobre\n\nJaborandiTransp "));
        assert!(about.contains("Jaborandi – SP"));
    }

    #[test]
    fn test_period_bar_order() {
        let line = line();
        assert_eq!(period_bar(&line, Some("Domingo")), " Seg–Sex  [Domingo]");
    }

    #[test]
    fn test_stops_and_prices() {
        let line = line().with_price("Jaborandi → Colina", 6.5);
        let text = stops(&line, &Palette::PLAIN);
        assert!(text.starts_with("Trajeto · 3 paradas"));
        assert!(prices(&line, &Palette::PLAIN).contains("R$ 6,50"));
        assert_eq!(stops(&BusLine::new("2", "2", "x"), &Palette::PLAIN), format!("{}\n", NO_ROUTE_INFO));
    }
}
