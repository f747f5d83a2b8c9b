use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                nickname        TEXT NOT NULL,
                email           TEXT UNIQUE,
                phone_number    TEXT,
                image_url       TEXT,
                password        TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE categories (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL
            );

            CREATE TABLE keywords (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                code    INTEGER NOT NULL
            );

            CREATE TABLE books (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                title               TEXT NOT NULL,
                subtitle            TEXT NOT NULL DEFAULT '',
                author              TEXT NOT NULL,
                company             TEXT NOT NULL DEFAULT '',
                image_url           TEXT NOT NULL DEFAULT '',
                page                INTEGER NOT NULL DEFAULT 0,
                publication_date    TEXT NOT NULL,
                contents            TEXT NOT NULL DEFAULT '',
                company_review      TEXT NOT NULL DEFAULT '',
                description         TEXT NOT NULL DEFAULT '',
                category_id         INTEGER NOT NULL REFERENCES categories(id),
                keyword_id          INTEGER REFERENCES keywords(id)
            );

            CREATE INDEX idx_books_publication ON books(publication_date);
            CREATE INDEX idx_books_category ON books(category_id, publication_date);

            CREATE TABLE today_picks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                book_id     INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                pick_date   TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX idx_today_picks_date ON today_picks(pick_date);

            CREATE TABLE user_books (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                book_id     INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                page        INTEGER NOT NULL DEFAULT 0,
                read_secs   INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, book_id)
            );

            CREATE TABLE libraries (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                image_url   TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE library_books (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                library_id  INTEGER NOT NULL REFERENCES libraries(id) ON DELETE CASCADE,
                book_id     INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(library_id, book_id)
            );

            CREATE INDEX idx_library_books_book ON library_books(book_id, created_at);

            CREATE TABLE reviews (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                book_id     INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                contents    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_reviews_book ON reviews(book_id);

            CREATE TABLE likes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                review_id   INTEGER NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, review_id)
            );

            CREATE INDEX idx_likes_review ON likes(review_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
