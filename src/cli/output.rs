//! Output formatting for CLI commands

use crate::config::NotifyConfig;
use crate::notify::descriptor::descriptor;
use crate::notify::history::DeliveryRecord;

/// Render the `status` view: master switch, per-service validity,
/// filter settings and the most recent deliveries.
pub fn render_status(user: &str, config: &NotifyConfig, recent: &[DeliveryRecord]) -> String {
    let mut out = String::new();

    out.push_str(&format!("User:          {}\n", user));
    out.push_str(&format!(
        "Notifications: {}\n",
        if config.enabled { "enabled" } else { "disabled" }
    ));

    out.push_str("\nServices:\n");
    if config.services.is_empty() {
        out.push_str("  (none configured, run 'ipr setup <service>')\n");
    }
    for (name, service) in &config.services {
        out.push_str(&format!("  {} {}\n", name, service_state(name, service)));
    }

    out.push_str("\nFilters:\n");
    out.push_str(&format!(
        "  only_when_away: {}\n",
        config.filters.only_when_away
    ));
    out.push_str(&format!("  highlights:     {}\n", config.filters.highlights));
    out.push_str(&format!(
        "  keywords:       {}\n",
        render_list(&config.filters.keywords)
    ));
    let whitelist: Vec<String> = config.filters.channels.whitelist.iter().cloned().collect();
    let blacklist: Vec<String> = config.filters.channels.blacklist.iter().cloned().collect();
    out.push_str(&format!("  whitelist:      {}\n", render_list(&whitelist)));
    out.push_str(&format!("  blacklist:      {}\n", render_list(&blacklist)));

    out.push_str("\nRecent deliveries:\n");
    if recent.is_empty() {
        out.push_str("  (none)\n");
    }
    for record in recent {
        out.push_str(&format!(
            "  {} [{}] {} {}\n",
            record.sent_at.format("%Y-%m-%d %H:%M:%S"),
            record.service,
            record.title,
            record.channel
        ));
    }

    out
}

/// 单个服务的状态标记:停用 / 配置可用 / 配置有问题
fn service_state(name: &str, service: &crate::config::ServiceConfig) -> String {
    if !service.enabled {
        return "(disabled)".to_string();
    }
    match descriptor(name) {
        Some(desc) => match (desc.build)(service) {
            Ok(_) => "✅".to_string(),
            Err(e) => format!("⚠️  {}", e),
        },
        None => "⚠️  unknown service".to_string(),
    }
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
