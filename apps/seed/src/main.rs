//! Seed CLI - initializes the schema and inserts demo content: an admin
//! and a regular user, four categories, five posts and a few comments.
//! Running it twice is a no-op.

use anyhow::Result;
use chrono::Utc;
use rusqlite::params;

use quill_core::domain::PostStatus;
use quill_core::ports::PasswordService;
use quill_core::slug::slugify;
use quill_infra::auth::Argon2PasswordService;
use quill_infra::store::{SqliteStore, init_schema};

const POSTS: [(&str, &str, i64, PostStatus); 5] = [
    (
        "Getting Started with Rust in 2025",
        "## Why Rust?\n\nRust pairs memory safety with performance, and the tooling has never \
         been better.\n\n### Key Benefits\n\n- Catch whole bug classes at compile time\n- \
         Fearless refactoring backed by the type system\n- One binary, no runtime to ship\n\n\
         ### Setting Up\n\n```bash\ncurl https://sh.rustup.rs -sSf | sh\ncargo new hello\n```\n\n\
         Start small, lean on the compiler, and enjoy the ride.",
        1,
        PostStatus::Published,
    ),
    (
        "Designing Calm Interfaces",
        "## Less, but Better\n\nGood interfaces get out of the way. Start from the content, \
         remove chrome until it hurts, then add one thing back.\n\n### Practical Rules\n\n1. \
         One primary action per screen\n2. Spacing before borders\n3. System fonts are fine",
        2,
        PostStatus::Published,
    ),
    (
        "A Field Guide to REST Pagination",
        "## Page by Page\n\nLIMIT/OFFSET pagination is simple and good enough for most \
         content sites.\n\n### The Contract\n\n```json\n{\"data\": [], \"pagination\": \
         {\"page\": 1, \"limit\": 10, \"total\": 0, \"totalPages\": 0}}\n```\n\nClamp what \
         you accept and the client can never hurt you.",
        3,
        PostStatus::Published,
    ),
    (
        "Why I Still Blog",
        "## Writing is Thinking\n\nPublishing forces clarity. The archive becomes a \
         conversation with your past self, and occasionally a stranger writes back.",
        4,
        PostStatus::Published,
    ),
    (
        "Draft: SQLite Tricks Worth Knowing",
        "## Small Database, Big Features\n\nNotes in progress on partial indexes, generated \
         columns and the JSON functions.",
        1,
        PostStatus::Draft,
    ),
];

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt().with_env_filter("info").init();

    let path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/blog.db".to_string());
    if let Some(parent) = std::path::Path::new(&path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::open(&path)?;
    init_schema(&store)?;

    let existing = store.query_one(
        "SELECT id FROM users WHERE email = 'admin@blog.com'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    if existing.is_some() {
        tracing::info!("seed data already exists, skipping");
        return Ok(());
    }

    let passwords = Argon2PasswordService::new();
    let now = Utc::now();

    let admin_hash = passwords.hash("admin123")?;
    store.execute(
        "INSERT INTO users (email, password_hash, display_name, role, bio, created_at, updated_at)
         VALUES (?, ?, ?, 'admin', ?, ?, ?)",
        params![
            "admin@blog.com",
            admin_hash,
            "Admin",
            "Blog administrator and content creator.",
            now,
            now
        ],
    )?;

    let user_hash = passwords.hash("user123")?;
    store.execute(
        "INSERT INTO users (email, password_hash, display_name, bio, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            "user@blog.com",
            user_hash,
            "John Doe",
            "Regular blog reader and commenter.",
            now,
            now
        ],
    )?;

    for (name, description) in [
        ("Technology", "Latest in tech and programming"),
        ("Design", "UI/UX and visual design"),
        ("Tutorials", "Step-by-step guides"),
        ("Opinion", "Thoughts and perspectives"),
    ] {
        store.execute(
            "INSERT INTO categories (name, slug, description, created_at) VALUES (?, ?, ?, ?)",
            params![name, slugify(name), description, now],
        )?;
    }

    for (title, content, category_id, status) in POSTS {
        let excerpt = content
            .chars()
            .take(200)
            .filter(|c| !matches!(c, '#' | '*' | '`' | '>' | '-' | '[' | ']'))
            .collect::<String>()
            .trim()
            .to_string();
        let published_at = (status == PostStatus::Published).then_some(now);

        store.execute(
            "INSERT INTO posts (title, slug, content, excerpt, author_id, category_id,
                                status, published_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?, ?)",
            params![
                title,
                slugify(title),
                content,
                excerpt,
                category_id,
                status.as_str(),
                published_at,
                now,
                now
            ],
        )?;
    }

    for (post_id, user_id, content) in [
        (1, 2, "Great introduction, thanks!"),
        (1, 1, "Glad it helped. More posts coming soon."),
        (2, 2, "Switched to this approach last year and never looked back."),
    ] {
        store.execute(
            "INSERT INTO comments (post_id, user_id, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![post_id, user_id, content, now, now],
        )?;
    }

    tracing::info!("seed data created");
    tracing::info!("admin: admin@blog.com / admin123");
    tracing::info!("user:  user@blog.com / user123");
    Ok(())
}
