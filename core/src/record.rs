//! Per-player batch rows.
//!
//! A `PlayerRecord` is the immutable raw view of one player in one uploaded
//! batch. `None` means the column was absent from the upload (or, for dates
//! and login counts, the cell was null/unparseable) — that distinction
//! drives the "drop the component, don't fail the row" scoring rules.

use chrono::NaiveDate;

use crate::{
    error::{HealthError, HealthResult},
    region::Region,
    table::DataTable,
    types::PlayerId,
};

// Column aliases, case/whitespace-normalized. CRM exports have drifted over
// time; first match wins.
pub const ID_ALIASES: &[&str] = &["player_id", "pid", "id"];
pub const VIP_ALIASES: &[&str] = &["nivel_vip", "vip_tier", "vip"];
pub const LAST_LOGIN_ALIASES: &[&str] = &["lastlogin", "last_login"];
pub const LOGINS_ALIASES: &[&str] = &["qtd_logins_3d", "logins_3d"];
pub const TOURNAMENTS_ALIASES: &[&str] = &["qtd_torneios_3d", "torneios_3d", "qtd_torneios"];
pub const MARATHONS_ALIASES: &[&str] = &["qtd_maratonas_3d", "maratonas_3d", "qtd_maratonas"];
pub const MISSIONS_ALIASES: &[&str] = &[
    "qtd_missoes_3d",
    "missoes_3d",
    "qtd_missoes",
    "qtd_missões_3d",
];
pub const PROMOS_ALIASES: &[&str] = &["qtd_promos_3d", "promos_3d", "qtd_promos"];
pub const PURCHASES_ALIASES: &[&str] = &["qtd_compras_7d", "compras_7d"];
pub const TICKET_ALIASES: &[&str] = &["ticket_medio_7d", "ticket_medio"];
pub const LAST_PURCHASE_ALIASES: &[&str] = &["ultima_compra", "last_purchase"];
pub const TRANSLATION_ALIASES: &[&str] = &["translation", "locale"];

#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub vip_tier: Option<u8>,
    pub last_login: Option<NaiveDate>,
    pub logins_3d: Option<f64>,
    pub tournaments_3d: Option<f64>,
    pub marathons_3d: Option<f64>,
    pub missions_3d: Option<f64>,
    pub promos_3d: Option<f64>,
    pub purchases_7d: Option<f64>,
    pub avg_ticket_7d: Option<f64>,
    pub last_purchase: Option<NaiveDate>,
    pub region: Region,
}

impl PlayerRecord {
    /// Build the batch's records from the tabular view.
    ///
    /// The only hard requirement is a player id column; every metric is
    /// optional and simply reads as absent when its column is missing.
    pub fn from_table(table: &DataTable) -> HealthResult<Vec<PlayerRecord>> {
        if table.is_empty() {
            return Err(HealthError::EmptyBatch);
        }
        let cols = ColumnMap::resolve(table)?;

        let records = (0..table.row_count())
            .map(|row| cols.read_row(table, row))
            .collect();
        Ok(records)
    }
}

/// Resolved column indices for one batch. Resolved once, reused per row.
struct ColumnMap {
    id: usize,
    vip: Option<usize>,
    last_login: Option<usize>,
    logins: Option<usize>,
    tournaments: Option<usize>,
    marathons: Option<usize>,
    missions: Option<usize>,
    promos: Option<usize>,
    purchases: Option<usize>,
    ticket: Option<usize>,
    last_purchase: Option<usize>,
    translation: Option<usize>,
}

impl ColumnMap {
    fn resolve(table: &DataTable) -> HealthResult<Self> {
        let id = table
            .find_column(ID_ALIASES)
            .ok_or_else(|| HealthError::MissingIdColumn {
                expected: ID_ALIASES.join(", "),
            })?;
        Ok(Self {
            id,
            vip: table.find_column(VIP_ALIASES),
            last_login: table.find_column(LAST_LOGIN_ALIASES),
            logins: table.find_column(LOGINS_ALIASES),
            tournaments: table.find_column(TOURNAMENTS_ALIASES),
            marathons: table.find_column(MARATHONS_ALIASES),
            missions: table.find_column(MISSIONS_ALIASES),
            promos: table.find_column(PROMOS_ALIASES),
            purchases: table.find_column(PURCHASES_ALIASES),
            ticket: table.find_column(TICKET_ALIASES),
            last_purchase: table.find_column(LAST_PURCHASE_ALIASES),
            translation: table.find_column(TRANSLATION_ALIASES),
        })
    }

    fn read_row(&self, table: &DataTable, row: usize) -> PlayerRecord {
        let player_id = table
            .text_at(row, self.id)
            .map(str::to_string)
            .or_else(|| table.number_at(row, self.id).map(|n| format!("{n}")))
            .unwrap_or_else(|| format!("row_{row}"));

        let translation = self.translation.and_then(|c| table.text_at(row, c));

        PlayerRecord {
            player_id,
            vip_tier: self.vip.and_then(|c| table.number_at(row, c)).map(|v| {
                // Tiers run 1–5; out-of-range exports get clamped, not dropped.
                (v.round() as i64).clamp(1, 5) as u8
            }),
            last_login: self.date_at(table, row, self.last_login),
            // A null login count skips the frequency component, matching the
            // dashboard behaviour; activity counts read as zero instead.
            logins_3d: self.logins.and_then(|c| table.number_at(row, c)),
            tournaments_3d: count_at(table, row, self.tournaments),
            marathons_3d: count_at(table, row, self.marathons),
            missions_3d: count_at(table, row, self.missions),
            promos_3d: count_at(table, row, self.promos),
            purchases_7d: count_at(table, row, self.purchases),
            avg_ticket_7d: count_at(table, row, self.ticket),
            last_purchase: self.date_at(table, row, self.last_purchase),
            region: Region::from_translation(translation),
        }
    }

    fn date_at(&self, table: &DataTable, row: usize, col: Option<usize>) -> Option<NaiveDate> {
        let text = col.and_then(|c| table.text_at(row, c))?;
        match parse_date(text) {
            Some(date) => Some(date),
            None => {
                log::debug!("row {row}: unparseable date {text:?}, treating as absent");
                None
            }
        }
    }
}

/// Column present: null/garbage cells count as zero activity for that row.
/// Column absent: the whole metric stays `None`.
fn count_at(table: &DataTable, row: usize, col: Option<usize>) -> Option<f64> {
    col.map(|c| table.number_at(row, c).unwrap_or(0.0))
}

/// Tolerant date parsing for the formats seen in CRM exports.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> DataTable {
        let mut t = DataTable::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row);
        }
        t
    }

    #[test]
    fn pid_alias_resolves_player_id() {
        let t = table(
            &["PID", "qtd_torneios_3d"],
            vec![vec![
                CellValue::Text("P001".into()),
                CellValue::Number(12.0),
            ]],
        );
        let records = PlayerRecord::from_table(&t).unwrap();
        assert_eq!(records[0].player_id, "P001");
        assert_eq!(records[0].tournaments_3d, Some(12.0));
    }

    #[test]
    fn absent_column_reads_as_none_empty_cell_as_zero() {
        let t = table(
            &["player_id", "qtd_torneios_3d"],
            vec![vec![CellValue::Text("P001".into()), CellValue::Empty]],
        );
        let records = PlayerRecord::from_table(&t).unwrap();
        assert_eq!(records[0].tournaments_3d, Some(0.0));
        assert_eq!(records[0].marathons_3d, None);
    }

    #[test]
    fn unparseable_date_is_absent() {
        let t = table(
            &["player_id", "lastlogin"],
            vec![vec![
                CellValue::Text("P001".into()),
                CellValue::Text("not-a-date".into()),
            ]],
        );
        let records = PlayerRecord::from_table(&t).unwrap();
        assert_eq!(records[0].last_login, None);
    }

    #[test]
    fn date_formats_parse() {
        assert!(parse_date("2026-08-30").is_some());
        assert!(parse_date("30/08/2026").is_some());
        assert!(parse_date("2026-08-30 14:00:00").is_some());
    }

    #[test]
    fn missing_id_column_is_an_error() {
        let t = table(&["qtd_torneios_3d"], vec![vec![CellValue::Number(1.0)]]);
        assert!(PlayerRecord::from_table(&t).is_err());
    }
}
