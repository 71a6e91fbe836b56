//! Fixed steering text and product copy used by the chat and recommendation
//! paths. Everything here is compiled in: the relay carries no prompt files.

/// Steering prompt prepended to every chat call. Shapes tone and content only;
/// the upstream model does all actual language work.
pub const SYSTEM_INSTRUCTION: &str = r#"
You are "AFA_OS", the central intelligence for AFA Media.
You are NOT a generic assistant. You are an Elite Digital Architect and Growth Strategist.

**YOUR PRIME DIRECTIVE:**
Analyze the user's business needs and guide them to the "Free Strategy Session" (the contact form).

**YOUR PERSONALITY MATRIX:**
- **Tone:** Cyber-Corporate, Clinical, High-Value, Efficient.
- **Vocabulary:** Use terms like: "Protocol", "Architecture", "Ecosystem", "Revenue Leak", "Optimization", "Deployment".
- **Forbidden:** Do not use fluff (e.g., "I hope this helps", "Feel free to ask", "Buddy"). Do not be subservient. Be an expert.

**KNOWLEDGE BASE (SERVICES):**
1. **Core Protocol (SmartSite + Meta Ads):**
   - The foundation. A high-conversion landing page + CRM.
   - **PRICE:** £330 one-time setup (Reduced from £1000).
   - **Note:** We manage their Meta Ads for FREE. They only pay ad spend.

2. **Neural Sales Funnels (Email Systems):**
   - For converting existing leads.
   - **Flashpoint Single:** £50 (1 Email).
   - **Conversion Triad:** £110 (3 Emails).
   - **Cash Injection Protocol:** £170 (4-Day Campaign).

3. **Full Brand Architecture (Upgrade):**
   - For authority and SEO.
   - **PRICE:** £270 (Reduced from £887).
   - Includes: 4 Custom Pages, AI Chatbot, 3D Elements.

**PROTOCOL FOR INTERACTION:**
1. **If asked about Pricing:** present data as a clean, bulleted list. Be transparent.
   End with: "ROI is the only metric that matters."
2. **If asked about Services:** do not list features. Describe *outcomes*.
3. **If an Image is Uploaded (Visual Scan):** immediately critique the design. Look for:
   "Low Contrast", "Weak Call to Action", "Clutter". Be harsh but professional.
4. **If no Image is provided:** answer their text question efficiently.

**CLOSING RULE:**
Keep responses under 3 sentences unless presenting data. Always drive towards the *Strategy Session*.
"#;

/// Model-authored message every fresh session opens with. Always sits at index
/// 0 of a session and is never forwarded upstream.
pub const WELCOME_BANNER: &str = "AFA_OS v2.4 Online. I analyze digital infrastructure for revenue leaks.\n\nUpload a screenshot for visual diagnostics, or query our growth protocols.";

/// Caption used when an image arrives without accompanying text.
pub const IMAGE_ONLY_CAPTION: &str = "Analyze this image.";

/// Marker substituted for image bytes when replaying history upstream.
pub const IMAGE_HISTORY_MARKER: &str = "[User uploaded an image]";

/// Recommendation returned when the model's answer carries no pipe delimiter.
/// A deliberate safe fallback, not an error.
pub const DEFAULT_RECOMMENDATION_SERVICE: &str = "AI SmartSite + Meta Ads";
pub const DEFAULT_RECOMMENDATION_REASON: &str =
    "Our analysis indicates this is the most effective protocol for scaling your specific sector.";

/// One offered service package, as enumerated in the recommendation prompt.
pub struct ServicePackage {
    pub title: &'static str,
    pub fit: &'static str,
}

pub const SERVICES: &[ServicePackage] = &[
    ServicePackage {
        title: "AI SmartSite + Meta Ads",
        fit: "Best for businesses needing a full lead-gen infrastructure. Good for Real Estate, Local Services, Contractors.",
    },
    ServicePackage {
        title: "Sales Email Copywriting",
        fit: "Best for businesses with existing leads needing higher conversion. Good for E-com, Newsletters, Coaches.",
    },
    ServicePackage {
        title: "Full Multi-Page Upgrade",
        fit: "Best for large brands requiring extensive SEO and content depth. Good for Law Firms, Corporate, Tech.",
    },
];

/// Build the single free-text prompt for the recommendation path. The model is
/// instructed to pick exactly one package and answer `ServiceName|Reason`.
pub fn recommendation_prompt(niche: &str) -> String {
    let services = SERVICES.iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {} ({})", i + 1, s.title, s.fit))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Context: You are the AI intake system for AFA Media.\n\
         User Niche: \"{}\"\n\n\
         Available Services:\n{}\n\n\
         Task: Recommend the ONE best service for this niche based on their typical operational needs.\n\
         Analyze the niche. Does it rely on quick leads? Retention? Brand authority?\n\
         Select the service that fits best. Be objective and do not simply default to the SmartSite unless it genuinely fits.\n\n\
         Output Format strictly:\n\
         Service Name|Short futuristic explanation why.",
        niche,
        services
    )
}

/// Canned quick answer matched locally before any upstream call.
pub struct FaqEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
    pub answer: &'static str,
}

pub const FAQ: &[FaqEntry] = &[
    FaqEntry {
        id: "pricing",
        label: "Pricing Data",
        keywords: &["price", "cost", "how much", "pricing", "expensive", "money"],
        answer: "SYSTEM PRICING DATA:\n\n1. Neural Sales Funnels:\n   \u{2022} Flashpoint Single: \u{a3}50\n   \u{2022} Conversion Triad: \u{a3}110\n   \u{2022} Cash Injection Protocol: \u{a3}170\n\n2. Full Brand Architecture (Upgrade):\n   \u{2022} NOW: \u{a3}270 (Reduced from \u{a3}887)\n   \u{2022} Includes: 4 Pages, Lead Capture, Chatbot, 3D Elements.\n\n3. Core Protocol (SmartSite):\n   \u{2022} NOW: \u{a3}330 (Reduced from \u{a3}1000)\n   \u{2022} Client pays for build. Meta Ads management is FREE.",
    },
    FaqEntry {
        id: "services",
        label: "Identify Protocol",
        keywords: &["service", "what do you do", "offer", "products", "what is this"],
        answer: "We deploy AI SmartSites, manage Meta Ad campaigns (for free), and implement Neural Email Copywriting systems.",
    },
    FaqEntry {
        id: "timeline",
        label: "Timeframe",
        keywords: &["how long", "time", "duration", "fast", "when"],
        answer: "System deployment typically requires 10-14 days after the strategy alignment session.",
    },
    FaqEntry {
        id: "guarantee",
        label: "Risk Assessment",
        keywords: &["guarantee", "refund", "results", "risk"],
        answer: "We operate on a performance basis defined during your strategy session. If KPIs aren't met, we work for free until they are.",
    },
];

/// Case-insensitive substring match over the FAQ keyword table.
pub fn faq_answer(input: &str) -> Option<&'static str> {
    let lower = input.to_lowercase();
    FAQ.iter()
        .find(|entry| entry.keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|entry| entry.answer)
}
