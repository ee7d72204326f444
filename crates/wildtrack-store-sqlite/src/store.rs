//! [`SqliteStore`] — the SQLite implementation of [`TrackStore`].

use std::path::Path;

use chrono::{Duration, Utc};
use rusqlite::OptionalExtension as _;
use wildtrack_core::{
  animal::{Animal, LifeStatus, NewAnimal},
  point::Point,
  store::TrackStore,
  visit::VisitedPoint,
};

use crate::{
  Error, Result,
  encode::{
    RawAnimal, RawPoint, RawVisit, encode_dt, encode_gender, encode_life_status,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A wildtrack store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// statements run serialised on the connection's worker thread, so
/// individual operations never interleave.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TrackStore impl ─────────────────────────────────────────────────────────

impl TrackStore for SqliteStore {
  type Error = Error;

  // ── Animals ───────────────────────────────────────────────────────────────

  async fn add_animal(&self, input: NewAnimal) -> Result<Animal> {
    let chipped_at = Utc::now();

    let weight     = f64::from(input.weight);
    let length     = f64::from(input.length);
    let height     = f64::from(input.height);
    let gender_str = encode_gender(input.gender).to_owned();
    let status_str = encode_life_status(LifeStatus::Alive).to_owned();
    let at_str     = encode_dt(chipped_at);
    let chip_id    = input.chip_point_id;

    let animal_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO animals (
             weight, length, height, gender, life_status, chipped_at, chip_point_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            weight, length, height, gender_str, status_str, at_str, chip_id,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Animal {
      animal_id,
      weight: input.weight,
      length: input.length,
      height: input.height,
      gender: input.gender,
      life_status: LifeStatus::Alive,
      chipped_at,
      chip_point_id: input.chip_point_id,
      death_at: None,
    })
  }

  async fn get_animal(&self, id: i64) -> Result<Option<Animal>> {
    let raw: Option<RawAnimal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT animal_id, weight, length, height, gender, life_status,
                      chipped_at, chip_point_id, death_at
               FROM animals WHERE animal_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawAnimal {
                  animal_id:     row.get(0)?,
                  weight:        row.get(1)?,
                  length:        row.get(2)?,
                  height:        row.get(3)?,
                  gender:        row.get(4)?,
                  life_status:   row.get(5)?,
                  chipped_at:    row.get(6)?,
                  chip_point_id: row.get(7)?,
                  death_at:      row.get(8)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAnimal::into_animal).transpose()
  }

  async fn update_animal(&self, animal: &Animal) -> Result<()> {
    let animal_id  = animal.animal_id;
    let weight     = f64::from(animal.weight);
    let length     = f64::from(animal.length);
    let height     = f64::from(animal.height);
    let gender_str = encode_gender(animal.gender).to_owned();
    let status_str = encode_life_status(animal.life_status).to_owned();
    let chip_id    = animal.chip_point_id;
    let death_str  = animal.death_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE animals
           SET weight = ?2, length = ?3, height = ?4, gender = ?5,
               life_status = ?6, chip_point_id = ?7, death_at = ?8
           WHERE animal_id = ?1",
          rusqlite::params![
            animal_id, weight, length, height, gender_str, status_str, chip_id,
            death_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_animal(&self, id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM animals WHERE animal_id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Points ────────────────────────────────────────────────────────────────

  async fn add_point(
    &self,
    latitude: Option<f64>,
    longitude: Option<f64>,
  ) -> Result<Point> {
    let point_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO points (latitude, longitude) VALUES (?1, ?2)",
          rusqlite::params![latitude, longitude],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Point { point_id, latitude, longitude })
  }

  async fn get_point(&self, id: i64) -> Result<Option<Point>> {
    let raw: Option<RawPoint> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT point_id, latitude, longitude FROM points WHERE point_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawPoint {
                  point_id:  row.get(0)?,
                  latitude:  row.get(1)?,
                  longitude: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawPoint::into_point))
  }

  async fn find_point_at(
    &self,
    latitude: Option<f64>,
    longitude: Option<f64>,
  ) -> Result<Option<Point>> {
    let raw: Option<RawPoint> = self
      .conn
      .call(move |conn| {
        // `IS` instead of `=` so NULL coordinates compare equal to NULL.
        Ok(
          conn
            .query_row(
              "SELECT point_id, latitude, longitude FROM points
               WHERE latitude IS ?1 AND longitude IS ?2",
              rusqlite::params![latitude, longitude],
              |row| {
                Ok(RawPoint {
                  point_id:  row.get(0)?,
                  latitude:  row.get(1)?,
                  longitude: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawPoint::into_point))
  }

  async fn update_point(&self, point: &Point) -> Result<()> {
    let point_id  = point.point_id;
    let latitude  = point.latitude;
    let longitude = point.longitude;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE points SET latitude = ?2, longitude = ?3 WHERE point_id = ?1",
          rusqlite::params![point_id, latitude, longitude],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_point(&self, id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM points WHERE point_id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn point_referenced(&self, id: i64) -> Result<bool> {
    let referenced: bool = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM visits  WHERE point_id = ?1)
               OR EXISTS(SELECT 1 FROM animals WHERE chip_point_id = ?1)",
          rusqlite::params![id],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(referenced)
  }

  // ── Visits ────────────────────────────────────────────────────────────────

  async fn visits_of(&self, animal_id: i64) -> Result<Vec<VisitedPoint>> {
    let raws: Vec<RawVisit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT visit_id, animal_id, point_id, visited_at
           FROM visits WHERE animal_id = ?1
           ORDER BY visited_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![animal_id], |row| {
            Ok(RawVisit {
              visit_id:   row.get(0)?,
              animal_id:  row.get(1)?,
              point_id:   row.get(2)?,
              visited_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisit::into_visit).collect()
  }

  async fn get_visit(&self, id: i64) -> Result<Option<VisitedPoint>> {
    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT visit_id, animal_id, point_id, visited_at
               FROM visits WHERE visit_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawVisit {
                  visit_id:   row.get(0)?,
                  animal_id:  row.get(1)?,
                  point_id:   row.get(2)?,
                  visited_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVisit::into_visit).transpose()
  }

  async fn append_visit(&self, animal_id: i64, point_id: i64) -> Result<VisitedPoint> {
    // Assign a timestamp strictly greater than every existing entry so
    // timestamp order can never diverge from insertion order, even when two
    // appends land within clock granularity.
    let mut visited_at = Utc::now();
    if let Some(last) = self.visits_of(animal_id).await?.last()
      && visited_at <= last.visited_at
    {
      visited_at = last.visited_at + Duration::milliseconds(1);
    }

    let at_str = encode_dt(visited_at);
    let visit_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO visits (animal_id, point_id, visited_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![animal_id, point_id, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(VisitedPoint { visit_id, animal_id, point_id, visited_at })
  }

  async fn update_visit_point(&self, visit_id: i64, point_id: i64) -> Result<VisitedPoint> {
    let raw: RawVisit = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE visits SET point_id = ?2 WHERE visit_id = ?1",
          rusqlite::params![visit_id, point_id],
        )?;
        Ok(conn.query_row(
          "SELECT visit_id, animal_id, point_id, visited_at
           FROM visits WHERE visit_id = ?1",
          rusqlite::params![visit_id],
          |row| {
            Ok(RawVisit {
              visit_id:   row.get(0)?,
              animal_id:  row.get(1)?,
              point_id:   row.get(2)?,
              visited_at: row.get(3)?,
            })
          },
        )?)
      })
      .await?;

    raw.into_visit()
  }

  async fn delete_visit(&self, visit_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM visits WHERE visit_id = ?1", rusqlite::params![visit_id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_visit_pair(&self, first_id: i64, second_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM visits WHERE visit_id = ?1", rusqlite::params![first_id])?;
        tx.execute("DELETE FROM visits WHERE visit_id = ?1", rusqlite::params![second_id])?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
