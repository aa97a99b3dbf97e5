//! Tabular renderings of a [`MatchTable`].

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use cav_core::errors::CavError;
use cav_core::floats::format_sentinel_f64;
use cav_core::table::{write_csv, write_csv_to};

use crate::report::MatchTable;

/// Column headers of the matching CSV.
pub const MATCH_HEADERS: [&str; 14] = [
    "emitter",
    "energy_ev",
    "wavelength_nm",
    "in_acceptance_window",
    "enhancement",
    "windowed_enhancement",
    "matched_wavelength_nm",
    "lifetime_ratio",
    "lifetime_ns",
    "peak_wavelength_nm",
    "peak_enhancement",
    "detuning_nm",
    "pool_rule",
    "pick_rule",
];

/// Column headers of the tolerance CSV.
pub const TOLERANCE_HEADERS: [&str; 4] =
    ["emitter", "detuning_nm", "enhancement", "windowed_enhancement"];

fn rule_label<T: serde::Serialize>(rule: &T) -> String {
    serde_json::to_value(rule)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn match_rows(table: &MatchTable) -> Vec<Vec<String>> {
    table
        .records
        .iter()
        .map(|r| {
            vec![
                r.emitter.clone(),
                format_sentinel_f64(r.energy_ev),
                format_sentinel_f64(r.wavelength_nm),
                r.in_window.to_string(),
                format_sentinel_f64(r.enhancement),
                format_sentinel_f64(r.windowed_enhancement),
                format_sentinel_f64(r.matched_wavelength_nm),
                format_sentinel_f64(r.lifetime_ratio),
                format_sentinel_f64(r.lifetime_ns),
                format_sentinel_f64(table.peak.wavelength_nm),
                format_sentinel_f64(table.peak.enhancement),
                format_sentinel_f64(r.detuning_nm),
                rule_label(&r.selection.pool),
                rule_label(&r.selection.pick),
            ]
        })
        .collect()
}

fn tolerance_rows(table: &MatchTable) -> Vec<Vec<String>> {
    table
        .tolerance_curve()
        .into_iter()
        .map(|p| {
            vec![
                p.emitter,
                format_sentinel_f64(p.detuning_nm),
                format_sentinel_f64(p.enhancement),
                format_sentinel_f64(p.windowed_enhancement),
            ]
        })
        .collect()
}

impl MatchTable {
    /// Writes the matching table as CSV.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), CavError> {
        write_csv(path, &MATCH_HEADERS, match_rows(self))
    }

    /// Streams the matching table as CSV.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<(), CavError> {
        write_csv_to(writer, &MATCH_HEADERS, match_rows(self))
    }

    /// Writes the detuning-vs-enhancement relationship as CSV.
    pub fn write_tolerance_csv(&self, path: impl AsRef<Path>) -> Result<(), CavError> {
        write_csv(path, &TOLERANCE_HEADERS, tolerance_rows(self))
    }

    /// Booktabs LaTeX table.
    pub fn to_latex(&self) -> String {
        let mut out = String::new();
        out.push_str("\\begin{table}[t]\n\\centering\n");
        out.push_str(
            "\\caption{ZPL--Purcell matching. $F_p(\\lambda_{\\mathrm{ZPL}})$ is read from the \
             enhancement spectrum at each ZPL wavelength; $\\tau_{\\mathrm{cav}}=\\tau_0/F_p$.}\n",
        );
        out.push_str("\\label{tab:zpl_purcell}\n\\begin{tabular}{lcccccc}\n\\toprule\n");
        out.push_str(
            "Emitter & ZPL (eV) & ZPL (nm) & In window & $F_p(\\lambda_{\\mathrm{ZPL}})$ & \
             $\\tau_{\\mathrm{cav}}/\\tau_0$ & $|\\Delta\\lambda|$ (nm) \\\\\n",
        );
        out.push_str("\\midrule\n");
        for r in &self.records {
            let ratio = if r.lifetime_ratio.is_finite() {
                format!("{:.3}", r.lifetime_ratio)
            } else {
                "$\\infty$".to_string()
            };
            let _ = writeln!(
                out,
                "{} & {:.2} & {:.1} & {} & {:.2} & {} & {:.1} \\\\",
                escape_latex(&r.emitter),
                r.energy_ev,
                r.wavelength_nm,
                if r.in_window { "Yes" } else { "No" },
                r.enhancement,
                ratio,
                r.detuning_nm
            );
        }
        out.push_str("\\bottomrule\n\\end{tabular}\n\\end{table}\n");
        out
    }

    /// Fixed-width plain-text table.
    pub fn to_text(&self) -> String {
        let header = [
            "emitter", "E(eV)", "ZPL(nm)", "window", "Fp", "Fp(win)", "tau/tau0", "|dl|(nm)",
        ];
        let rows: Vec<[String; 8]> = self
            .records
            .iter()
            .map(|r| {
                [
                    r.emitter.clone(),
                    format!("{:.3}", r.energy_ev),
                    format!("{:.1}", r.wavelength_nm),
                    if r.in_window { "yes" } else { "no" }.to_string(),
                    format!("{:.3}", r.enhancement),
                    format!("{:.3}", r.windowed_enhancement),
                    if r.lifetime_ratio.is_finite() {
                        format!("{:.4}", r.lifetime_ratio)
                    } else {
                        "inf".to_string()
                    },
                    format!("{:.1}", r.detuning_nm),
                ]
            })
            .collect();
        let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "peak: {:.1} nm, Fp = {:.3}",
            self.peak.wavelength_nm, self.peak.enhancement
        );
        let line = |cells: Vec<&str>| {
            cells
                .iter()
                .zip(widths.iter())
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        out.push_str(&line(header.to_vec()));
        out.push('\n');
        for row in &rows {
            out.push_str(&line(row.iter().map(String::as_str).collect()));
            out.push('\n');
        }
        out
    }
}

fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '_' | '&' | '%' | '#' | '$' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latex_escapes_identifiers() {
        assert_eq!(escape_latex("V_B-C_N"), "V\\_B-C\\_N");
        assert_eq!(escape_latex("a&b"), "a\\&b");
    }
}
