//! RSS, sitemap and robots feeds - XML assembled by hand.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::middleware::error::AppResult;
use crate::state::AppState;

const SITE_TITLE: &str = "Quill";
const SITE_DESCRIPTION: &str = "A personal blog";

struct FeedPost {
    title: String,
    slug: String,
    excerpt: Option<String>,
    author_name: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// GET /api/feed/rss - RSS 2.0 with the 20 latest published posts. Item
/// descriptions carry the excerpt; bodies stay on the site.
pub async fn rss(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.store.query(
        "SELECT p.title, p.slug, p.excerpt, p.published_at, p.created_at,
                u.display_name AS author_name
         FROM posts p
         LEFT JOIN users u ON p.author_id = u.id
         WHERE p.status = 'published'
         ORDER BY p.published_at DESC
         LIMIT 20",
        [],
        map_feed_post,
    )?;

    let site = &state.site_url;
    let mut items = String::new();
    for post in &posts {
        let date = post.published_at.unwrap_or(post.created_at).to_rfc2822();
        items.push_str(&format!(
            "\n    <item>\n      <title><![CDATA[{title}]]></title>\n      \
             <link>{site}/posts/{slug}</link>\n      \
             <description><![CDATA[{excerpt}]]></description>\n      \
             <author>{author}</author>\n      \
             <pubDate>{date}</pubDate>\n      \
             <guid isPermaLink=\"true\">{site}/posts/{slug}</guid>\n    </item>",
            title = post.title,
            slug = post.slug,
            excerpt = post.excerpt.as_deref().unwrap_or(""),
            author = xml_escape(post.author_name.as_deref().unwrap_or("")),
        ));
    }

    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\" \
         xmlns:atom=\"http://www.w3.org/2005/Atom\">\n  <channel>\n    \
         <title>{SITE_TITLE}</title>\n    \
         <link>{site}</link>\n    \
         <description>{SITE_DESCRIPTION}</description>\n    \
         <language>en</language>\n    \
         <lastBuildDate>{build_date}</lastBuildDate>\n    \
         <atom:link href=\"{site}/api/feed/rss\" rel=\"self\" type=\"application/rss+xml\" />{items}\n  \
         </channel>\n</rss>",
        build_date = Utc::now().to_rfc2822(),
    );

    Ok(HttpResponse::Ok()
        .content_type("application/xml")
        .body(xml))
}

/// GET /api/feed/sitemap.xml - home page, published posts and categories.
pub async fn sitemap(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts: Vec<(String, DateTime<Utc>)> = state.store.query(
        "SELECT slug, updated_at FROM posts WHERE status = 'published'
         ORDER BY published_at DESC",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let categories: Vec<String> =
        state
            .store
            .query("SELECT slug FROM categories", [], |row| row.get(0))?;

    let site = &state.site_url;
    let mut urls = vec![format!(
        "<url><loc>{site}</loc><changefreq>daily</changefreq><priority>1.0</priority></url>"
    )];
    for (slug, updated_at) in &posts {
        urls.push(format!(
            "<url><loc>{site}/posts/{slug}</loc><lastmod>{lastmod}</lastmod>\
             <changefreq>weekly</changefreq><priority>0.8</priority></url>",
            lastmod = updated_at.to_rfc3339(),
        ));
    }
    for slug in &categories {
        urls.push(format!(
            "<url><loc>{site}/category/{slug}</loc>\
             <changefreq>weekly</changefreq><priority>0.6</priority></url>"
        ));
    }

    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n  {}\n</urlset>",
        urls.join("\n  "),
    );

    Ok(HttpResponse::Ok()
        .content_type("application/xml")
        .body(xml))
}

/// GET /api/feed/robots.txt
pub async fn robots(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body(format!(
        "User-agent: *\nAllow: /\nSitemap: {}/api/feed/sitemap.xml\n",
        state.site_url
    ))
}

fn map_feed_post(row: &Row<'_>) -> rusqlite::Result<FeedPost> {
    Ok(FeedPost {
        title: row.get("title")?,
        slug: row.get("slug")?,
        excerpt: row.get("excerpt")?,
        author_name: row.get("author_name")?,
        published_at: row.get("published_at")?,
        created_at: row.get("created_at")?,
    })
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
