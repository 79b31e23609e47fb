#[cfg(feature = "ssr")]
mod db_impl {
    use crate::models::review::{
        ModerationAction, Paginated, Rating, Review, ReviewResponse, ReviewStatus, ReviewType,
    };
    use crate::models::shop::Shop;
    use crate::models::user::{display_name, Role, User};
    use crate::review::trust::{average_rating, TrustGrade};
    use chrono::{Duration, Utc};
    use leptos::logging::log;
    use rusqlite::functions::FunctionFlags;
    use rusqlite::types::{Type, Value};
    use rusqlite::{ffi, params, params_from_iter, Connection, Error, OptionalExtension, Row, Transaction};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    const REVIEW_COLUMNS: &str = "
        SELECT r.id, r.shop_id, s.name, s.category, r.user_id, u.full_name, r.rating, r.comment,
               r.proof_order_number, r.proof_chat_history, r.status, r.review_type, r.admin_notes,
               rr.response, r.created_at, r.updated_at
        FROM reviews r
        JOIN shops s ON s.id = r.shop_id
        JOIN users u ON u.id = r.user_id
        LEFT JOIN review_responses rr ON rr.review_id = r.id";

    /// Which reviews a listing returns.
    #[derive(Debug, Clone, Default)]
    pub struct ReviewFilter {
        pub shop_id: Option<String>,
        pub user_id: Option<String>,
        pub status: Option<ReviewStatus>,
        pub review_type: Option<ReviewType>,
        pub public_only: bool,
        pub search: Option<String>,
        pub page: u32,
        pub limit: u32,
    }

    #[derive(Debug, Clone)]
    pub struct Database {
        conn: Arc<Mutex<Connection>>,
    }

    fn conversion_error<E>(idx: usize, err: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    }

    fn review_from_row(row: &Row<'_>) -> Result<Review, Error> {
        let rating: u8 = row.get(6)?;
        let status: String = row.get(10)?;
        let review_type: String = row.get(11)?;
        let full_name: String = row.get(5)?;
        Ok(Review {
            id: row.get(0)?,
            shop_id: row.get(1)?,
            shop_name: row.get(2)?,
            shop_category: row.get(3)?,
            user_id: row.get(4)?,
            user_name: display_name(&full_name),
            rating: Rating::new(rating).map_err(|e| conversion_error(6, e))?,
            comment: row.get(7)?,
            proof_order_number: row.get(8)?,
            proof_photos: Vec::new(),
            proof_chat_history: row.get(9)?,
            status: status.parse().map_err(|e| conversion_error(10, e))?,
            review_type: review_type.parse().map_err(|e| conversion_error(11, e))?,
            admin_notes: row.get(12)?,
            response: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    fn user_from_row(row: &Row<'_>) -> Result<User, Error> {
        let role: String = row.get(3)?;
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            role: role.parse().map_err(|e| conversion_error(3, e))?,
        })
    }

    fn shop_from_row(row: &Row<'_>) -> Result<Shop, Error> {
        Ok(Shop {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            website: row.get(3)?,
            owner_id: row.get(4)?,
            rating: row.get(5)?,
            review_count: row.get(6)?,
            trust_grade: row.get(7)?,
        })
    }

    /// True for a violated `UNIQUE` constraint, such as a second review of the same shop.
    pub fn is_unique_violation(err: &Error) -> bool {
        matches!(err, Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
    }

    /// SQLite folds case for ASCII only; search compares through this instead.
    fn register_functions(conn: &Connection) -> Result<(), Error> {
        conn.create_scalar_function(
            "unicode_lower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
        )
    }

    fn load_photos(conn: &Connection, review: &mut Review) -> Result<(), Error> {
        let mut stmt =
            conn.prepare_cached("SELECT data FROM review_photos WHERE review_id = ? ORDER BY position ASC")?;
        let photos = stmt.query_map([&review.id], |row| row.get(0))?;
        review.proof_photos = photos.collect::<Result<_, _>>()?;
        Ok(())
    }

    fn replace_photos(tx: &Transaction<'_>, review_id: &str, photos: &[String]) -> Result<(), Error> {
        tx.execute("DELETE FROM review_photos WHERE review_id = ?", [review_id])?;
        for (position, data) in photos.iter().enumerate() {
            tx.execute(
                "INSERT INTO review_photos (review_id, position, data) VALUES (?, ?, ?)",
                params![review_id, position as i64, data],
            )?;
        }
        Ok(())
    }

    impl Database {
        pub fn new(db_path: &str) -> Result<Self, Error> {
            let conn = Connection::open(db_path)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            register_functions(&conn)?;
            log!("[DB] Connection established at: {}", db_path);
            Ok(Database { conn: Arc::new(Mutex::new(conn)) })
        }

        pub async fn create_schema(&self) -> Result<(), Error> {
            let conn = self.conn.lock().await;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    email TEXT NOT NULL UNIQUE,
                    full_name TEXT NOT NULL,
                    role TEXT NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );
                CREATE TABLE IF NOT EXISTS sessions (
                    token TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating user tables: {}", e);
                e
            })?;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS shops (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    category TEXT,
                    website TEXT,
                    owner_id TEXT,
                    rating REAL NOT NULL DEFAULT 0,
                    review_count INTEGER NOT NULL DEFAULT 0,
                    trust_grade TEXT,
                    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE SET NULL
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating shops table: {}", e);
                e
            })?;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS reviews (
                    id TEXT PRIMARY KEY,
                    shop_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    comment TEXT NOT NULL,
                    proof_order_number TEXT,
                    proof_chat_history TEXT,
                    status TEXT NOT NULL,
                    review_type TEXT NOT NULL DEFAULT 'verified',
                    admin_notes TEXT,
                    reviewed_by_admin TEXT,
                    review_date TIMESTAMP,
                    created_at TIMESTAMP NOT NULL,
                    updated_at TIMESTAMP NOT NULL,
                    FOREIGN KEY (shop_id) REFERENCES shops(id) ON DELETE CASCADE,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_reviews_status ON reviews(status);
                CREATE INDEX IF NOT EXISTS idx_reviews_shop ON reviews(shop_id);
                CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_user_shop ON reviews(user_id, shop_id);",
            )
            .map_err(|e| {
                eprintln!("Failed creating reviews table: {}", e);
                e
            })?;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS review_photos (
                    review_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    data TEXT NOT NULL,
                    PRIMARY KEY (review_id, position),
                    FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE
                );
                CREATE TABLE IF NOT EXISTS review_responses (
                    id TEXT PRIMARY KEY,
                    review_id TEXT NOT NULL UNIQUE,
                    shop_id TEXT NOT NULL,
                    responder_id TEXT NOT NULL,
                    response TEXT NOT NULL,
                    created_at TIMESTAMP NOT NULL,
                    FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE
                );",
            )
            .map_err(|e| {
                eprintln!("Failed creating review detail tables: {}", e);
                e
            })?;
            Ok(())
        }

        // Users and sessions

        pub async fn insert_user(&self, user: &User) -> Result<(), Error> {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO users (id, email, full_name, role) VALUES (?, ?, ?, ?)",
                params![user.id, user.email, user.full_name, user.role.as_str()],
            )?;
            log!("[DB] User inserted: {}", user.email);
            Ok(())
        }

        /// Issues a bearer token for `user_id`.
        pub async fn create_session(&self, user_id: &str) -> Result<String, Error> {
            let conn = self.conn.lock().await;
            let token = Uuid::new_v4().simple().to_string();
            conn.execute("INSERT INTO sessions (token, user_id) VALUES (?, ?)", params![token, user_id])?;
            Ok(token)
        }

        pub async fn user_for_token(&self, token: &str) -> Result<Option<User>, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                "SELECT u.id, u.email, u.full_name, u.role
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?",
                [token],
                user_from_row,
            )
            .optional()
        }

        // Shops

        pub async fn insert_shop(&self, shop: &Shop) -> Result<(), Error> {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO shops (id, name, category, website, owner_id) VALUES (?, ?, ?, ?, ?)",
                params![shop.id, shop.name, shop.category, shop.website, shop.owner_id],
            )?;
            log!("[DB] Shop inserted: {}", shop.name);
            Ok(())
        }

        pub async fn get_shop(&self, shop_id: &str) -> Result<Option<Shop>, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                "SELECT id, name, category, website, owner_id, rating, review_count, trust_grade
                 FROM shops WHERE id = ?",
                [shop_id],
                shop_from_row,
            )
            .optional()
        }

        /// Recomputes rating, count and grade from verified, visible reviews of the last year.
        pub async fn recompute_shop_rating(&self, shop_id: &str) -> Result<(), Error> {
            let conn = self.conn.lock().await;
            let cutoff = Utc::now() - Duration::days(365);
            let mut stmt = conn.prepare(
                "SELECT rating FROM reviews
                 WHERE shop_id = ? AND review_type = 'verified'
                   AND status IN ('published', 'approved') AND created_at >= ?",
            )?;
            let ratings = stmt
                .query_map(params![shop_id, cutoff], |row| row.get::<_, u8>(0))?
                .collect::<Result<Vec<u8>, _>>()?;
            let avg = average_rating(&ratings);
            let grade = TrustGrade::from_rating(avg);
            conn.execute(
                "UPDATE shops SET rating = ?, review_count = ?, trust_grade = ? WHERE id = ?",
                params![avg, ratings.len() as i64, grade.as_str(), shop_id],
            )?;
            log!("[DB] Shop {} rated {} over {} reviews ({})", shop_id, avg, ratings.len(), grade.as_str());
            Ok(())
        }

        // Reviews

        pub async fn insert_review(&self, review: &Review) -> Result<(), Error> {
            log!("[DB] Inserting review {} for shop {}", review.id, review.shop_id);
            let mut conn = self.conn.lock().await;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO reviews (id, shop_id, user_id, rating, comment, proof_order_number,
                    proof_chat_history, status, review_type, admin_notes, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    review.id,
                    review.shop_id,
                    review.user_id,
                    review.rating.get(),
                    review.comment,
                    review.proof_order_number,
                    review.proof_chat_history,
                    review.status.as_str(),
                    review.review_type.as_str(),
                    review.admin_notes,
                    review.created_at,
                    review.updated_at,
                ],
            )?;
            replace_photos(&tx, &review.id, &review.proof_photos)?;
            tx.commit()?;
            Ok(())
        }

        /// Persists an author's edit: content, proof and the recomputed status.
        /// Writes only while the stored status is still `expected`; returns `false`
        /// if a moderator decided in between. `restart_moderation` clears old notes.
        pub async fn update_review(
            &self,
            review: &Review,
            expected: ReviewStatus,
            restart_moderation: bool,
        ) -> Result<bool, Error> {
            let mut conn = self.conn.lock().await;
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE reviews SET rating = ?, comment = ?, proof_order_number = ?, proof_chat_history = ?,
                    status = ?, admin_notes = CASE WHEN ? THEN NULL ELSE admin_notes END, updated_at = ?
                 WHERE id = ? AND status = ?",
                params![
                    review.rating.get(),
                    review.comment,
                    review.proof_order_number,
                    review.proof_chat_history,
                    review.status.as_str(),
                    restart_moderation,
                    review.updated_at,
                    review.id,
                    expected.as_str(),
                ],
            )?;
            if updated == 0 {
                log!("[DB] Review {} left status {} before the edit landed", review.id, expected.as_str());
                return Ok(false);
            }
            replace_photos(&tx, &review.id, &review.proof_photos)?;
            tx.commit()?;
            log!("[DB] Review {} updated, status {}", review.id, review.status.as_str());
            Ok(true)
        }

        /// Replaces the evidence of a review that is still pending. Returns `false`
        /// if it is no longer pending.
        pub async fn attach_proof(
            &self,
            review_id: &str,
            order_number: &str,
            photos: &[String],
            chat_history: Option<&str>,
        ) -> Result<bool, Error> {
            let mut conn = self.conn.lock().await;
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE reviews SET proof_order_number = ?, proof_chat_history = ?, updated_at = ?
                 WHERE id = ? AND status = 'pending'",
                params![order_number, chat_history, Utc::now(), review_id],
            )?;
            if updated == 0 {
                return Ok(false);
            }
            replace_photos(&tx, review_id, photos)?;
            tx.commit()?;
            log!("[DB] Proof attached to review {} ({} photos)", review_id, photos.len());
            Ok(true)
        }

        pub async fn get_review(&self, review_id: &str) -> Result<Option<Review>, Error> {
            let conn = self.conn.lock().await;
            let sql = format!("{REVIEW_COLUMNS} WHERE r.id = ?");
            let review = conn.query_row(&sql, [review_id], review_from_row).optional()?;
            match review {
                Some(mut review) => {
                    load_photos(&conn, &mut review)?;
                    Ok(Some(review))
                }
                None => Ok(None),
            }
        }

        pub async fn user_has_reviewed_shop(&self, user_id: &str, shop_id: &str) -> Result<bool, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = ? AND shop_id = ?)",
                [user_id, shop_id],
                |row| row.get(0),
            )
        }

        /// Newest first, paginated.
        pub async fn query_reviews(&self, filter: &ReviewFilter) -> Result<Paginated<Review>, Error> {
            let mut clauses: Vec<&str> = Vec::new();
            let mut values: Vec<Value> = Vec::new();

            if let Some(shop_id) = &filter.shop_id {
                clauses.push("r.shop_id = ?");
                values.push(Value::Text(shop_id.clone()));
            }
            if let Some(user_id) = &filter.user_id {
                clauses.push("r.user_id = ?");
                values.push(Value::Text(user_id.clone()));
            }
            if let Some(status) = filter.status {
                clauses.push("r.status = ?");
                values.push(Value::Text(status.as_str().to_string()));
            }
            if let Some(review_type) = filter.review_type {
                clauses.push("r.review_type = ?");
                values.push(Value::Text(review_type.as_str().to_string()));
            }
            if filter.public_only {
                clauses.push("r.status IN ('approved', 'published')");
            }
            if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                clauses.push(
                    "(unicode_lower(r.comment) LIKE ? ESCAPE '\\'
                      OR unicode_lower(s.name) LIKE ? ESCAPE '\\'
                      OR unicode_lower(u.full_name) LIKE ? ESCAPE '\\')",
                );
                // wildcards in the term are literal
                let pattern = format!(
                    "%{}%",
                    search.to_lowercase().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
                );
                for _ in 0..3 {
                    values.push(Value::Text(pattern.clone()));
                }
            }

            let where_sql = if clauses.is_empty() {
                String::new()
            } else {
                format!(" WHERE {}", clauses.join(" AND "))
            };

            let limit = filter.limit.clamp(1, 100);
            let page = filter.page.max(1);
            let offset = u64::from(page - 1) * u64::from(limit);

            let conn = self.conn.lock().await;
            let count_sql = format!(
                "SELECT COUNT(*) FROM reviews r
                 JOIN shops s ON s.id = r.shop_id
                 JOIN users u ON u.id = r.user_id{where_sql}"
            );
            let total: i64 = conn.query_row(&count_sql, params_from_iter(values.iter()), |row| row.get(0))?;

            let list_sql = format!("{REVIEW_COLUMNS}{where_sql} ORDER BY r.created_at DESC LIMIT {limit} OFFSET {offset}");
            let mut stmt = conn.prepare(&list_sql)?;
            let mut reviews = stmt
                .query_map(params_from_iter(values.iter()), review_from_row)?
                .collect::<Result<Vec<Review>, _>>()?;
            for review in reviews.iter_mut() {
                load_photos(&conn, review)?;
            }

            log!("[DB] Listed {} of {} reviews", reviews.len(), total);
            Ok(Paginated::new(reviews, total as u64, page, limit))
        }

        /// Applies a moderator decision. Returns `None` if the review does not exist.
        /// Notes overwrite earlier notes, so repeating an action changes nothing.
        pub async fn apply_moderation(
            &self,
            review_id: &str,
            action: ModerationAction,
            notes: Option<&str>,
            admin_id: &str,
        ) -> Result<Option<ReviewStatus>, Error> {
            let conn = self.conn.lock().await;
            let current: Option<String> = conn
                .query_row("SELECT status FROM reviews WHERE id = ?", [review_id], |row| row.get(0))
                .optional()?;
            let Some(current) = current else {
                return Ok(None);
            };
            let current: ReviewStatus = current.parse().map_err(|e| conversion_error(0, e))?;
            let new_status = current.after_moderation(action);
            let now = Utc::now();
            conn.execute(
                "UPDATE reviews SET status = ?, admin_notes = COALESCE(?, admin_notes),
                    reviewed_by_admin = ?, review_date = ?, updated_at = ?
                 WHERE id = ?",
                params![new_status.as_str(), notes, admin_id, now, now, review_id],
            )?;
            log!("[DB] Review {} moderated: {} -> {}", review_id, current.as_str(), new_status.as_str());
            Ok(Some(new_status))
        }

        pub async fn delete_review(&self, review_id: &str) -> Result<bool, Error> {
            let conn = self.conn.lock().await;
            let deleted = conn.execute("DELETE FROM reviews WHERE id = ?", [review_id])?;
            log!("[DB] Review deleted: {} ({} rows)", review_id, deleted);
            Ok(deleted > 0)
        }

        // Shop-owner responses

        pub async fn insert_response(&self, response: &ReviewResponse) -> Result<(), Error> {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO review_responses (id, review_id, shop_id, responder_id, response, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    response.id,
                    response.review_id,
                    response.shop_id,
                    response.responder_id,
                    response.response,
                    response.created_at,
                ],
            )?;
            Ok(())
        }

        fn response_query(column: &str) -> String {
            format!(
                "SELECT id, review_id, shop_id, responder_id, response, created_at
                 FROM review_responses WHERE {column} = ?"
            )
        }

        fn response_from_row(row: &Row<'_>) -> Result<ReviewResponse, Error> {
            Ok(ReviewResponse {
                id: row.get(0)?,
                review_id: row.get(1)?,
                shop_id: row.get(2)?,
                responder_id: row.get(3)?,
                response: row.get(4)?,
                created_at: row.get(5)?,
            })
        }

        pub async fn response_for_review(&self, review_id: &str) -> Result<Option<ReviewResponse>, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(&Self::response_query("review_id"), [review_id], Self::response_from_row)
                .optional()
        }

        pub async fn get_response(&self, response_id: &str) -> Result<Option<ReviewResponse>, Error> {
            let conn = self.conn.lock().await;
            conn.query_row(&Self::response_query("id"), [response_id], Self::response_from_row)
                .optional()
        }

        pub async fn delete_response(&self, response_id: &str) -> Result<bool, Error> {
            let conn = self.conn.lock().await;
            Ok(conn.execute("DELETE FROM review_responses WHERE id = ?", [response_id])? > 0)
        }

        /// Creates demo accounts and a shop, returning `(email, token)` pairs to sign in with.
        pub async fn seed_demo_data(&self) -> Result<Vec<(String, String)>, Error> {
            let accounts = [
                ("admin@trustshop.local", "Ada Admin", Role::Admin),
                ("owner@trustshop.local", "Otto Owner", Role::ShopOwner),
                ("shopper@trustshop.local", "Sarah Klein", Role::Shopper),
            ];
            let mut tokens = Vec::new();
            let mut owner_id = None;
            for (email, name, role) in accounts {
                let user = User { id: Uuid::new_v4().to_string(), email: email.into(), full_name: name.into(), role };
                self.insert_user(&user).await?;
                if role == Role::ShopOwner {
                    owner_id = Some(user.id.clone());
                }
                tokens.push((user.email.clone(), self.create_session(&user.id).await?));
            }
            self.insert_shop(&Shop {
                id: Uuid::new_v4().to_string(),
                name: "Gadget Hub".into(),
                category: Some("electronics".into()),
                website: Some("https://gadgethub.example".into()),
                owner_id,
                rating: 0.0,
                review_count: 0,
                trust_grade: None,
            })
            .await?;
            Ok(tokens)
        }
    }

}

#[cfg(feature = "ssr")]
pub use db_impl::{is_unique_violation, Database, ReviewFilter};
