//! Structured game search: a predicate set
//! over player name, event, date range, ECO range, and result, with
//! pagination and a small set of sortable columns.

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::records::GameRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Year,
    Eco,
    RoundMajor,
}

impl SortColumn {
    fn column_name(self) -> &'static str {
        match self {
            SortColumn::Year => "year",
            SortColumn::Eco => "eco",
            SortColumn::RoundMajor => "round_major",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A set of optional filters, all of which must hold (logical AND) for a
/// game to match. `None` leaves that dimension unconstrained.
#[derive(Clone, Debug, Default)]
pub struct GameQuery {
    /// Matched against either side's `last_name` as a case-insensitive
    /// substring.
    pub player_name: Option<String>,
    pub event_name: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// Inclusive ECO-code range, e.g. `"A00"..="E99"`.
    pub eco_from: Option<String>,
    pub eco_to: Option<String>,
    pub result: Option<String>,
    pub sort: Option<(SortColumn, SortDirection)>,
    pub limit: u32,
    pub offset: u32,
}

impl GameQuery {
    pub fn new() -> GameQuery {
        GameQuery {
            limit: 50,
            ..Default::default()
        }
    }

    fn build(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut clauses = Vec::new();
        let mut binds: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(name) = &self.player_name {
            clauses.push(
                "(white_id IN (SELECT id FROM player WHERE lower(last_name) LIKE ?) \
                  OR black_id IN (SELECT id FROM player WHERE lower(last_name) LIKE ?))"
                    .to_string(),
            );
            let pattern = format!("%{}%", name.to_lowercase());
            binds.push(Box::new(pattern.clone()));
            binds.push(Box::new(pattern));
        }
        if let Some(event) = &self.event_name {
            clauses.push("event_id IN (SELECT id FROM event WHERE lower(name) LIKE ?)".to_string());
            binds.push(Box::new(format!("%{}%", event.to_lowercase())));
        }
        if let Some(from) = self.year_from {
            clauses.push("year >= ?".to_string());
            binds.push(Box::new(from));
        }
        if let Some(to) = self.year_to {
            clauses.push("year <= ?".to_string());
            binds.push(Box::new(to));
        }
        if let Some(from) = &self.eco_from {
            clauses.push("eco >= ?".to_string());
            binds.push(Box::new(from.clone()));
        }
        if let Some(to) = &self.eco_to {
            clauses.push("eco <= ?".to_string());
            binds.push(Box::new(to.clone()));
        }
        if let Some(result) = &self.result {
            clauses.push("result = ?".to_string());
            binds.push(Box::new(result.clone()));
        }

        let mut sql = "SELECT id, white_id, black_id, event_id, site_id, annotator_id, \
                       round_major, round_minor, day, month, year, result, eco, \
                       time_control_blob, moves_blob, annotations_blob, partial_flag FROM game"
            .to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some((col, dir)) = self.sort {
            let dir_sql = match dir {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", col.column_name(), dir_sql));
        }
        sql.push_str(" LIMIT ? OFFSET ?");
        binds.push(Box::new(self.limit));
        binds.push(Box::new(self.offset));

        (sql, binds)
    }
}

pub fn run_query(conn: &Connection, query: &GameQuery) -> Result<Vec<GameRecord>> {
    let (sql, binds) = query.build();
    let refs: Vec<&dyn rusqlite::ToSql> = binds.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(refs.as_slice(), |row| {
        Ok(GameRecord {
            id: row.get(0)?,
            white_id: row.get(1)?,
            black_id: row.get(2)?,
            event_id: row.get(3)?,
            site_id: row.get(4)?,
            annotator_id: row.get(5)?,
            round_major: row.get(6)?,
            round_minor: row.get(7)?,
            day: row.get(8)?,
            month: row.get(9)?,
            year: row.get(10)?,
            result: row.get(11)?,
            eco: row.get(12)?,
            time_control_blob: row.get::<_, Option<Vec<u8>>>(13)?.unwrap_or_default(),
            moves_blob: row.get(14)?,
            annotations_blob: row.get::<_, Option<Vec<u8>>>(15)?.unwrap_or_default(),
            partial_flag: row.get::<_, i64>(16)? != 0,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::StoreHandle;
    use crate::repo;

    #[test]
    fn filters_by_year_range_and_result() {
        let mut h = StoreHandle::new();
        h.open_in_memory().unwrap();
        let conn = h.connection_mut().unwrap();
        for (year, result) in [(1990, "1-0"), (1999, "0-1"), (2005, "1-0")] {
            let record = GameRecord {
                year: Some(year),
                result: result.to_string(),
                moves_blob: vec![0],
                ..Default::default()
            };
            repo::insert_game(conn, &record, &[]).unwrap();
        }
        let conn = h.connection().unwrap();
        let q = GameQuery {
            year_from: Some(1995),
            result: Some("1-0".to_string()),
            limit: 10,
            ..GameQuery::new()
        };
        let results = run_query(conn, &q).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].year, Some(2005));
    }

    #[test]
    fn pagination_limits_and_offsets() {
        let mut h = StoreHandle::new();
        h.open_in_memory().unwrap();
        let conn = h.connection_mut().unwrap();
        for year in 2000..2005 {
            let record = GameRecord {
                year: Some(year),
                moves_blob: vec![0],
                ..Default::default()
            };
            repo::insert_game(conn, &record, &[]).unwrap();
        }
        let conn = h.connection().unwrap();
        let q = GameQuery {
            limit: 2,
            offset: 1,
            sort: Some((SortColumn::Year, SortDirection::Ascending)),
            ..GameQuery::new()
        };
        let results = run_query(conn, &q).unwrap();
        assert_eq!(results.iter().map(|r| r.year).collect::<Vec<_>>(), vec![Some(2001), Some(2002)]);
    }
}
