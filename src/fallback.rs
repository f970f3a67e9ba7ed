//! Static content served when the CMS cannot be reached.
//!
//! Items are built through [`ContentItem`] so they serialize to exactly the
//! shape the CMS emits; the page renderer never needs to know which source
//! it got.

use serde_json::{json, Value};

use crate::types::{Collection, ContentItem};

/// Fallback items for one collection, in display order.
pub fn fallback_items(collection: Collection) -> Vec<ContentItem> {
    match collection {
        Collection::Services => services(),
        Collection::Cases => cases(),
        Collection::Team => team(),
        Collection::Testimonials => testimonials(),
        // No invented articles: the blog teaser is simply left out.
        Collection::Posts => Vec::new(),
    }
}

/// Fallback set as the JSON array the CMS would have returned.
pub fn fallback_set(collection: Collection) -> Value {
    serde_json::to_value(fallback_items(collection)).unwrap_or_else(|_| Value::Array(Vec::new()))
}

pub fn find_by_slug(collection: Collection, slug: &str) -> Option<ContentItem> {
    fallback_items(collection).into_iter().find(|item| item.slug == slug)
}

fn services() -> Vec<ContentItem> {
    vec![
        ContentItem::new(1, "web-development", "Web Development")
            .with_excerpt("<p>Fast, accessible websites and web apps built on modern frameworks.</p>")
            .with_content("<p>From marketing sites to complex platforms, we design, build and run web products that load fast and convert.</p>")
            .with_featured_image("/images/services/web-development.jpg", "Web development")
            .with_field("service_icon", json!("code"))
            .with_field("features", json!(["Responsive design", "Headless CMS", "Performance budgets"])),
        ContentItem::new(2, "mobile-apps", "Mobile Apps")
            .with_excerpt("<p>Native and cross-platform apps for iOS and Android.</p>")
            .with_content("<p>We ship mobile apps from first prototype to store release, and keep them healthy afterwards.</p>")
            .with_featured_image("/images/services/mobile-apps.jpg", "Mobile apps")
            .with_field("service_icon", json!("smartphone"))
            .with_field("features", json!(["iOS & Android", "Offline first", "App store launch"])),
        ContentItem::new(3, "ui-ux-design", "UI/UX Design")
            .with_excerpt("<p>Research-led product design that users actually enjoy.</p>")
            .with_content("<p>Interviews, prototypes and design systems that keep your product consistent as it grows.</p>")
            .with_featured_image("/images/services/ui-ux-design.jpg", "UI/UX design")
            .with_field("service_icon", json!("palette"))
            .with_field("features", json!(["User research", "Prototyping", "Design systems"])),
        ContentItem::new(4, "digital-marketing", "Digital Marketing")
            .with_excerpt("<p>SEO, paid media and analytics tied to real business goals.</p>")
            .with_content("<p>We plan and run campaigns with measurable outcomes and transparent reporting.</p>")
            .with_featured_image("/images/services/digital-marketing.jpg", "Digital marketing")
            .with_field("service_icon", json!("trending-up"))
            .with_field("features", json!(["SEO", "Paid campaigns", "Conversion tracking"])),
    ]
}

fn cases() -> Vec<ContentItem> {
    vec![
        ContentItem::new(101, "fintech-dashboard", "Fintech Dashboard Redesign")
            .with_excerpt("<p>A trading dashboard rebuilt for clarity and speed.</p>")
            .with_content("<p>We rebuilt the client dashboard around the three tasks traders perform most.</p>")
            .with_featured_image("/images/cases/fintech-dashboard.jpg", "Fintech dashboard")
            .with_field("client_name", json!("NorthBank Capital"))
            .with_field("industry", json!("Finance"))
            .with_field("results", json!("40% faster task completion")),
        ContentItem::new(102, "retail-ecommerce", "Retail E-commerce Platform")
            .with_excerpt("<p>A headless storefront for a national retail chain.</p>")
            .with_content("<p>A headless storefront with a shared catalogue across web and in-store kiosks.</p>")
            .with_featured_image("/images/cases/retail-ecommerce.jpg", "Retail platform")
            .with_field("client_name", json!("Urban Goods"))
            .with_field("industry", json!("Retail"))
            .with_field("results", json!("2.3x online revenue in six months")),
        ContentItem::new(103, "health-booking-app", "Healthcare Booking App")
            .with_excerpt("<p>Appointment booking for a network of clinics.</p>")
            .with_content("<p>Patients book, reschedule and receive reminders from a single app.</p>")
            .with_featured_image("/images/cases/health-booking-app.jpg", "Healthcare app")
            .with_field("client_name", json!("CarePoint Clinics"))
            .with_field("industry", json!("Healthcare"))
            .with_field("results", json!("60% fewer missed appointments")),
    ]
}

fn team_member(id: u64, slug: &str, name: &str, position: &str, expertise: Value) -> ContentItem {
    ContentItem::new(id, slug, name)
        .with_excerpt(format!("<p>{position}</p>"))
        .with_featured_image(format!("/images/team/{slug}.jpg"), name)
        .with_field("position", json!(position))
        .with_field(
            "social_links",
            json!({
                "linkedin": format!("https://www.linkedin.com/in/{slug}"),
                "twitter": "",
            }),
        )
        .with_field("expertise", expertise)
}

fn team() -> Vec<ContentItem> {
    vec![
        team_member(201, "alex-morgan", "Alex Morgan", "Founder & CEO", json!(["Strategy", "Product"])),
        team_member(202, "sam-rivera", "Sam Rivera", "Head of Design", json!(["UX Research", "Design Systems"])),
        team_member(203, "jordan-lee", "Jordan Lee", "Lead Engineer", json!(["Rust", "TypeScript", "Cloud"])),
        team_member(204, "taylor-kim", "Taylor Kim", "Marketing Director", json!(["SEO", "Content", "Analytics"])),
    ]
}

fn testimonial(id: u64, slug: &str, author: &str, quote: &str, position: &str, company: &str) -> ContentItem {
    ContentItem::new(id, slug, author)
        .with_content(format!("<p>{quote}</p>"))
        .with_excerpt(format!("<p>{quote}</p>"))
        .with_field("rating", json!(5))
        .with_field("company", json!(company))
        .with_field("author_position", json!(position))
}

fn testimonials() -> Vec<ContentItem> {
    vec![
        testimonial(
            301,
            "maria-santos",
            "Maria Santos",
            "They understood our business from day one and delivered ahead of schedule.",
            "CTO",
            "NorthBank Capital",
        ),
        testimonial(
            302,
            "david-chen",
            "David Chen",
            "Our online sales more than doubled after the relaunch.",
            "E-commerce Manager",
            "Urban Goods",
        ),
        testimonial(
            303,
            "emma-wilson",
            "Emma Wilson",
            "A genuinely collaborative team. Patients love the new app.",
            "Operations Director",
            "CarePoint Clinics",
        ),
    ]
}
