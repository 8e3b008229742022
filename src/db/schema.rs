//! Database schema and migrations for Ovoo.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones already ran.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id              TEXT PRIMARY KEY,
    role            TEXT NOT NULL DEFAULT 'regular',  -- 'regular', 'admin', 'milter'
    login           TEXT NOT NULL UNIQUE,
    first_name      TEXT NOT NULL DEFAULT '',
    last_name       TEXT NOT NULL DEFAULT '',
    password_hash   TEXT NOT NULL DEFAULT '',          -- Argon2 PHC string
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: addresses
    r#"
-- owner_id has no foreign key: external addresses outlive
-- the user whose alias first received mail from them.
CREATE TABLE addresses (
    id                  TEXT PRIMARY KEY,
    kind                TEXT NOT NULL,  -- 'alias', 'reply_alias', 'protected', 'external'
    email               TEXT NOT NULL,
    forward_address_id  TEXT REFERENCES addresses(id),
    owner_id            TEXT NOT NULL,
    comment             TEXT NOT NULL DEFAULT '',
    service_name        TEXT NOT NULL DEFAULT '',
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    updated_by          TEXT,
    UNIQUE(email, kind)
);

CREATE INDEX idx_addresses_email ON addresses(email);
CREATE INDEX idx_addresses_owner_id ON addresses(owner_id);
CREATE INDEX idx_addresses_forward_address_id ON addresses(forward_address_id);
"#,
    // v3: chains
    r#"
CREATE TABLE chains (
    hash                    TEXT PRIMARY KEY,
    from_address_id         TEXT NOT NULL REFERENCES addresses(id),
    to_address_id           TEXT NOT NULL REFERENCES addresses(id),
    orig_from_address_id    TEXT NOT NULL REFERENCES addresses(id),
    orig_to_address_id      TEXT NOT NULL REFERENCES addresses(id),
    created_at              TEXT NOT NULL
);

CREATE INDEX idx_chains_from_address_id ON chains(from_address_id);
CREATE INDEX idx_chains_orig_to_address_id ON chains(orig_to_address_id);
"#,
    // v4: api tokens
    r#"
CREATE TABLE api_tokens (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    token       TEXT NOT NULL UNIQUE,
    owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at  TEXT NOT NULL,
    active      INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_api_tokens_owner_id ON api_tokens(owner_id);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_contains_users_table() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE users"));
        assert!(first.contains("login"));
        assert!(first.contains("password_hash"));
    }

    #[test]
    fn test_addresses_unique_per_kind() {
        assert!(MIGRATIONS[1].contains("UNIQUE(email, kind)"));
    }

    #[test]
    fn test_chains_keyed_by_hash() {
        assert!(MIGRATIONS[2].contains("hash                    TEXT PRIMARY KEY"));
    }

    #[test]
    fn test_migrations_are_valid_sql() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(migration.contains("CREATE TABLE") || migration.contains("ALTER TABLE"));
        }
    }
}
