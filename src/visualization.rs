use std::{
    collections::{BTreeMap, HashSet},
    fmt::Write as _,
    fs,
    path::Path,
};

use crate::{
    booking::Booking,
    history::History,
    status::BookingStatus,
    transition::{Actor, Operation},
};

/// Visualization tools for the booking lifecycle
#[derive(Debug)]
pub struct LifecycleVisualization;

impl LifecycleVisualization {
    /// Generate a DOT graph of the ordinary transition table.
    ///
    /// With `booking`, the edges it actually traversed are drawn in red, and
    /// administrative overrides it went through are added as dashed edges.
    #[must_use]
    pub fn generate_dot(booking: Option<&Booking>) -> String {
        let mut dot = String::from("digraph booking_lifecycle {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=circle, style=filled, fillcolor=lightblue];\n");

        let current = booking.map(Booking::status);
        for status in BookingStatus::ALL {
            let shape = if status.is_terminal() { ", shape=doublecircle" } else { "" };
            let fill = if Some(status) == current { ", fillcolor=palegreen" } else { "" };
            let _ = writeln!(dot, "  {status} [label=\"{status}\"{shape}{fill}];");
        }

        let traversed: HashSet<(BookingStatus, BookingStatus, Actor)> = booking
            .map(|b| {
                b.history()
                    .iter()
                    .filter_map(|entry| entry.from.map(|from| (from, entry.to, entry.by)))
                    .collect()
            })
            .unwrap_or_default();

        for operation in Operation::ON_EXISTING {
            for from in BookingStatus::ALL.into_iter().filter(|s| operation.permits(*s)) {
                let to = operation.target();
                let style = if traversed.contains(&(from, to, operation.actor())) {
                    "color=red, penwidth=2.0"
                } else {
                    "color=black"
                };
                let _ = writeln!(
                    dot,
                    "  {from} -> {to} [label=\"{operation} ({})\", {style}];",
                    operation.actor()
                );
            }
        }

        let mut overrides: Vec<(BookingStatus, BookingStatus)> = traversed
            .iter()
            .filter(|(_, _, by)| *by == Actor::Admin)
            .map(|(from, to, _)| (*from, *to))
            .collect();
        overrides.sort();
        for (from, to) in overrides {
            let _ = writeln!(
                dot,
                "  {from} -> {to} [label=\"override (ADMIN)\", style=dashed, color=red];"
            );
        }

        dot.push_str("}\n");
        dot
    }

    /// Save the DOT representation to a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to
    pub fn save_dot_to_file(dot: &str, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        fs::write(path, dot)
    }

    /// Generate a markdown table of a booking's history
    #[must_use]
    pub fn history_table(history: &History) -> String {
        if history.is_empty() {
            return "No transitions recorded yet.".to_string();
        }

        let mut table = String::from("| # | From | To | By | At |\n");
        table.push_str("|---|------|----|----|----|\n");

        for (i, entry) in history.iter().enumerate() {
            let _ = writeln!(
                table,
                "| {} | {} | {} | {} | {} |",
                i.saturating_add(1),
                entry.from.map_or("-", BookingStatus::as_str),
                entry.to,
                entry.by,
                entry.at.to_rfc3339()
            );
        }

        table
    }

    /// Generate a summary of bookings per status
    #[must_use]
    pub fn stats_table(counts: &BTreeMap<BookingStatus, usize>) -> String {
        let total: usize = counts.values().sum();
        let mut out = format!("Total bookings: {total}\n");
        for status in BookingStatus::ALL {
            let count = counts.get(&status).copied().unwrap_or(0);
            let _ = writeln!(out, "  {:<12} {count}", status.as_str());
        }
        out
    }
}
