use std::fmt::Write as _;

use super::{html_shell, page_header, select_options};
use crate::genie::ChatMessage;
use crate::render::{MessageView, escaped};
use crate::workflows::brand::LogoStyle;
use crate::workflows::{business_plan, llc, pitch_deck};

/// First assistant message of every conversation.
pub const WELCOME_MESSAGE: &str = "## Welcome to Cardinal Business Genie \u{1F3AF}

I'm your **AI partner** in building empires. I can help you with:

- **LLC Formation** - State selection, documents, compliance
- **Business Planning** - Strategies, financial projections, market analysis
- **Branding & Marketing** - Identity, positioning, growth tactics
- **Tax Structures** - LLC vs S-Corp vs C-Corp comparisons
- **Investor Relations** - Pitch decks, valuations, fundraising

How can I assist you today?";

/// Quick-action labels; each fills the input with `Help me with: <label>`.
pub const QUICK_ACTIONS: [&str; 8] = [
    "Form an LLC",
    "Create a Brand",
    "Tax Structure",
    "Business Plan",
    "Marketing Strategy",
    "Investor Pitch",
    "Financial Projections",
    "Growth Strategy",
];

/// Chat page with the welcome message pre-rendered.
pub fn chat_page() -> String {
    let history = vec![ChatMessage::assistant(WELCOME_MESSAGE)];
    // `<` is escaped so the JSON cannot close the script element.
    let history_json = serde_json::to_string(&history)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c");

    let mut actions = String::new();
    for action in QUICK_ACTIONS {
        let _ = write!(
            actions,
            r#"<button type="button" class="chip" data-quick-action="{0}">{0}</button>"#,
            escaped(action)
        );
    }

    let content = format!(
        r#"<section class="chat-shell" data-chat>
    <div class="chat-header"><span class="brand-mark">C</span><h2>Business Genie</h2></div>
    <div class="chat-messages" data-chat-messages>
        <div class="message message-assistant"><div class="bubble">{welcome}</div></div>
    </div>
    <form class="chat-input" data-chat-form>
        <input type="text" name="message" autocomplete="off" placeholder="Ask about LLC formation, branding, strategy..." data-chat-input>
        <button type="submit" class="btn btn-primary" data-chat-send>Send</button>
    </form>
    <div class="quick-actions">{actions}</div>
    <script type="application/json" id="chat-history">{history_json}</script>
</section>"#,
        welcome = MessageView::assistant(WELCOME_MESSAGE).render(),
    );
    html_shell("AI Chat", "/", &content)
}

fn text_field(name: &str, label: &str, placeholder: &str, required: bool) -> String {
    format!(
        r#"<label class="field"><span class="field-label">{}{}</span><input type="text" name="{name}" placeholder="{}"></label>"#,
        escaped(label),
        if required { " *" } else { "" },
        escaped(placeholder)
    )
}

fn textarea_field(name: &str, label: &str, placeholder: &str, required: bool) -> String {
    format!(
        r#"<label class="field"><span class="field-label">{}{}</span><textarea name="{name}" rows="4" placeholder="{}"></textarea></label>"#,
        escaped(label),
        if required { " *" } else { "" },
        escaped(placeholder)
    )
}

fn select_field(name: &str, label: &str, placeholder: &str, options: &[(&str, &str)], required: bool) -> String {
    format!(
        r#"<label class="field"><span class="field-label">{}{}</span><select name="{name}">{}</select></label>"#,
        escaped(label),
        if required { " *" } else { "" },
        select_options(placeholder, options, "")
    )
}

/// Two-column workflow layout: form on the left, result panel on the right.
fn workflow_layout(action: &str, form_body: &str, submit: &str, empty_result: &str) -> String {
    format!(
        r#"<div class="workflow">
    <form class="card workflow-form" method="post" action="{action}" data-workflow>
        {form_body}
        <button type="submit" class="btn btn-primary btn-block" data-submit>{submit}</button>
    </form>
    <div class="card workflow-result" data-result>
        <p class="result-empty">{empty_result}</p>
    </div>
</div>"#,
        submit = escaped(submit),
        empty_result = escaped(empty_result),
    )
}

/// Five-step LLC wizard; steps are switched client-side, the form posts once.
pub fn llc_page() -> String {
    let mut steps_nav = String::new();
    for (i, (title, description)) in llc::STEPS.iter().enumerate() {
        let _ = write!(
            steps_nav,
            r#"<li class="step{}" data-step-marker="{n}"><span class="step-number">{n}</span><span class="step-title">{}</span><span class="step-description">{}</span></li>"#,
            if i == 0 { " step-current" } else { "" },
            escaped(title),
            escaped(description),
            n = i + 1,
        );
    }

    let states: Vec<(&str, &str)> = llc::US_STATES.iter().map(|s| (*s, *s)).collect();
    let steps = [
        format!(
            r#"{}<p class="field-hint">"LLC" will be automatically added to your company name</p>"#,
            text_field("company_name", "Company Name", "Enter your desired company name", true)
        ),
        format!(
            r#"{}<ul class="field-hint"><li><strong>Your home state</strong> - Simplest option</li><li><strong>Delaware</strong> - Strong legal precedent</li><li><strong>Wyoming</strong> - Low fees and privacy</li></ul>"#,
            select_field("state", "State of Formation", "Select a state", &states, true)
        ),
        format!(
            "{}{}{}",
            select_field("business_type", "Business Type", "Select business type", &llc::BUSINESS_TYPES, false),
            select_field("owners", "Number of Members", "How many members?", &llc::OWNER_OPTIONS, false),
            textarea_field("purpose", "Business Purpose", "e.g., Software development and consulting", false),
        ),
        format!(
            "{}{}",
            text_field("registered_agent", "Registered Agent", "Person or company to receive legal documents", false),
            text_field("address", "Business Address", "Street address in the state of formation", false),
        ),
        r#"<div class="review" data-review></div>"#.to_string(),
    ];

    let mut fieldsets = String::new();
    for (i, body) in steps.iter().enumerate() {
        let _ = write!(
            fieldsets,
            r#"<fieldset class="wizard-step" data-step="{}"{}>{body}</fieldset>"#,
            i + 1,
            if i == 0 { "" } else { " hidden" }
        );
    }

    let form_body = format!(
        r#"<ol class="steps">{steps_nav}</ol>{fieldsets}<div class="wizard-nav"><button type="button" class="btn btn-outline" data-step-prev>Previous</button><button type="button" class="btn btn-outline" data-step-next>Next</button></div>"#
    );

    let content = format!(
        "{}{}",
        page_header("LLC Formation Wizard", "Form your LLC in minutes with AI-generated documents"),
        workflow_layout(
            "/api/llc-formation",
            &form_body,
            "Generate LLC Documents",
            "Complete the wizard to generate your formation package.",
        )
    );
    html_shell("LLC Formation", "/llc-formation", &content)
}

pub fn business_plan_page() -> String {
    let form_body = [
        text_field("business_name", "Business Name", "Enter your business name", true),
        select_field("industry", "Industry", "Select your industry", &business_plan::INDUSTRIES, true),
        select_field("business_model", "Business Model", "Select business model", &business_plan::MODELS, true),
        text_field("target_market", "Target Market", "e.g., Small businesses, millennials, enterprises", false),
        text_field("funding", "Funding Goal", "e.g., $500,000 seed round", false),
        textarea_field("description", "Business Description", "Describe your business idea, unique value proposition, and goals...", false),
    ]
    .concat();

    let content = format!(
        "{}{}",
        page_header("Business Plan Generator", "AI-powered comprehensive business plans in minutes"),
        workflow_layout(
            "/api/business-plan",
            &form_body,
            "Generate Business Plan",
            "Your eight-section business plan will appear here.",
        )
    );
    html_shell("Business Plan", "/business-plan", &content)
}

pub fn pitch_deck_page() -> String {
    let form_body = [
        text_field("company_name", "Company Name", "Your company name", true),
        select_field("industry", "Industry", "Select industry", &pitch_deck::INDUSTRIES, false),
        select_field("stage", "Stage", "Select stage", &pitch_deck::STAGES, false),
        text_field("funding_goal", "Funding Goal", "e.g., $2M seed round", false),
        textarea_field("problem_statement", "Problem Statement", "What problem are you solving? Who feels this pain?", true),
        textarea_field("solution", "Solution", "How does your product/service solve this problem?", true),
    ]
    .concat();

    let content = format!(
        "{}{}",
        page_header("Pitch Deck Generator", "Investor-ready presentations powered by AI"),
        workflow_layout(
            "/api/pitch-deck",
            &form_body,
            "Generate Pitch Deck",
            "Your slides will appear here.",
        )
    );
    html_shell("Pitch Deck", "/pitch-deck", &content)
}

pub fn brand_page() -> String {
    let styles: Vec<(&str, &str)> = LogoStyle::ALL.iter().map(|s| (s.as_str(), s.label())).collect();
    let style_select = format!(
        r#"<label class="field"><span class="field-label">Logo Style</span><select name="style">{}</select></label>"#,
        select_options("Select a style", &styles, LogoStyle::default().as_str())
    );
    let form_body = [
        text_field("business_name", "Business Name", "Enter your business name", true),
        text_field("industry", "Industry", "e.g., Technology, Healthcare, Finance", true),
        style_select,
        text_field("colors", "Preferred Colors", "e.g., Blue and Gold, Red and Black", false),
    ]
    .concat();

    let content = format!(
        "{}{}",
        page_header("Brand Generator", "Create a professional logo for your business"),
        workflow_layout(
            "/api/brand-generator",
            &form_body,
            "Generate Logo",
            "Your logo will appear here.",
        )
    );
    html_shell("Brand Generator", "/brand-generator", &content)
}

/// One entry on the services page.
struct ServiceCard {
    title: &'static str,
    description: &'static str,
    href: &'static str,
    cta: &'static str,
}

const SERVICES: [ServiceCard; 9] = [
    ServiceCard {
        title: "AI Business Consultant",
        description: "Get instant expert advice on any business topic. From LLC formation to marketing strategy, our AI consultant provides world-class guidance 24/7.",
        href: "/",
        cta: "Start Consulting",
    },
    ServiceCard {
        title: "Brand & Logo Generator",
        description: "Create stunning, professional logos and brand identities in seconds. AI-powered design that captures your business essence perfectly.",
        href: "/brand-generator",
        cta: "Create Brand",
    },
    ServiceCard {
        title: "Business Plan Generator",
        description: "Generate comprehensive, investor-ready business plans with financial projections, market analysis, and strategic roadmaps.",
        href: "/business-plan",
        cta: "Generate Plan",
    },
    ServiceCard {
        title: "LLC Formation Wizard",
        description: "Form your LLC in any state with step-by-step guidance. Get all necessary documents, operating agreements, and compliance checklists.",
        href: "/llc-formation",
        cta: "Start Formation",
    },
    ServiceCard {
        title: "Financial Calculator",
        description: "Calculate startup costs, revenue projections, break-even analysis, and funding requirements with our intelligent financial tools.",
        href: "/",
        cta: "Calculate Now",
    },
    ServiceCard {
        title: "Tax Structure Advisor",
        description: "Compare LLC, S-Corp, and C-Corp structures. Understand tax implications and choose the optimal structure for your situation.",
        href: "/",
        cta: "Get Advice",
    },
    ServiceCard {
        title: "Marketing Strategy",
        description: "Develop winning marketing strategies tailored to your industry. Get actionable campaigns, channel recommendations, and growth tactics.",
        href: "/",
        cta: "Build Strategy",
    },
    ServiceCard {
        title: "Investor Pitch Prep",
        description: "Prepare for investor meetings with pitch deck templates, valuation guidance, and practice Q&A sessions with our AI consultant.",
        href: "/",
        cta: "Prepare Pitch",
    },
    ServiceCard {
        title: "Growth Analytics",
        description: "Get insights on scaling your business with data-driven recommendations for operations, hiring, and market expansion.",
        href: "/",
        cta: "Analyze Growth",
    },
];

const SERVICE_STATS: [(&str, &str); 4] = [
    ("10K+", "Businesses Launched"),
    ("50K+", "Plans Generated"),
    ("100K+", "Logos Created"),
    ("98%", "Satisfaction Rate"),
];

/// Services overview: hero, one card per offering, a call to action and stats.
pub fn services_page() -> String {
    let mut cards = String::new();
    for card in &SERVICES {
        let _ = write!(
            cards,
            r#"<article class="service-card"><h3>{}</h3><p>{}</p><a href="{}" class="service-link">{} &rarr;</a></article>"#,
            escaped(card.title),
            escaped(card.description),
            card.href,
            escaped(card.cta)
        );
    }

    let mut stats = String::new();
    for (value, label) in SERVICE_STATS {
        let _ = write!(
            stats,
            r#"<div class="stat"><p class="stat-value">{value}</p><p class="stat-label">{label}</p></div>"#
        );
    }

    let content = format!(
        r#"<section class="hero">
    <h1 class="page-title">Our Services</h1>
    <p class="page-subtitle">Everything you need to launch, grow, and scale your business. Powered by AI, designed for entrepreneurs who dream big.</p>
</section>
<section class="service-grid">{cards}</section>
<section class="cta-panel">
    <h2>Ready to Build Your Empire?</h2>
    <p>Join thousands of entrepreneurs who are using Cardinal Business Genie to transform their ideas into thriving businesses.</p>
    <div class="cta-actions">
        <a href="/" class="btn btn-primary">Start Free Consultation</a>
        <a href="/llc-formation" class="btn btn-outline">Form Your LLC</a>
    </div>
</section>
<section class="stat-grid">{stats}</section>"#
    );
    html_shell("Services", "/services", &content)
}
