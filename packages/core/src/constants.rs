/// Categories seeded into every fresh store, as `(name, description)`
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Web Development", "Websites, web apps and backend services"),
    ("Smart Contracts", "Clarity contracts, audits and on-chain tooling"),
    ("Design", "UI/UX, branding and illustration"),
    ("Writing", "Documentation, copywriting and translation"),
    ("Marketing", "Community growth, social media and campaigns"),
    ("Data & Analytics", "Dashboards, indexing and data pipelines"),
];

/// Name reported by the service in health responses
pub const SERVICE_NAME: &str = "escrowdesk";
