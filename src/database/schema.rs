//! Database schema definitions
//!
//! Table and column names match the original on-device store so an existing
//! database file keeps working.

/// SQL to create the properties table
pub const CREATE_PROPERTIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS store_properties (
    database_id     CHAR(32) NOT NULL PRIMARY KEY,
    version         CHAR(10),
    create_timestamp TEXT
)
"#;

/// SQL to create the anonymous complaints table
pub const CREATE_COMPLAINTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS quejas_anonimas (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    tipo            TEXT NOT NULL,
    calle           TEXT NOT NULL,
    cruzamientos    TEXT NOT NULL,
    colonia         TEXT NOT NULL,
    tiempo_espera   TEXT NOT NULL,
    descripcion     TEXT NOT NULL,
    fecha_creacion  INTEGER NOT NULL,
    estado          TEXT NOT NULL DEFAULT 'PENDIENTE'
)
"#;

/// SQL to create the category index
pub const CREATE_CATEGORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS index_quejas_anonimas_tipo
ON quejas_anonimas (tipo)
"#;

/// SQL to create the neighborhood index
pub const CREATE_NEIGHBORHOOD_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS index_quejas_anonimas_colonia
ON quejas_anonimas (colonia)
"#;

/// All table and index creation statements in order
pub const CREATE_ALL_TABLES: &[&str] = &[
    CREATE_PROPERTIES_TABLE,
    CREATE_COMPLAINTS_TABLE,
    CREATE_CATEGORY_INDEX,
    CREATE_NEIGHBORHOOD_INDEX,
];
