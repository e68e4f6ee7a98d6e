// src/cli/setup.rs
//! Setup 命令 - 交互式配置通知服务
//!
//! 按服务的字段模式逐项提问,凭据字段走密码输入,最后整体校验再落盘。

use anyhow::Result;
use clap::Args;
use dialoguer::{Confirm, Input, Password};

use crate::config::ConfigStore;
use crate::notify::descriptor::{descriptor, descriptors, FieldSpec};

/// Setup 命令参数
#[derive(Args)]
pub struct SetupArgs {
    /// Service to configure: pushover, webhook
    pub service: String,
}

/// 处理 setup 命令
pub fn handle_setup(store: &ConfigStore, user: &str, args: &SetupArgs) -> Result<()> {
    let desc = match descriptor(&args.service) {
        Some(desc) => desc,
        None => {
            let known: Vec<&str> = descriptors().iter().map(|d| d.name).collect();
            anyhow::bail!(
                "unknown service '{}', available: {}",
                args.service,
                known.join(", ")
            );
        }
    };

    let mut config = store.load(user);

    println!("Configuring {} - {}", desc.name, desc.summary);

    if config.services.contains_key(desc.name) {
        let update = Confirm::new()
            .with_prompt(format!("{} is already configured, update it?", desc.name))
            .default(true)
            .interact()
            .unwrap_or(false);
        if !update {
            println!("Cancelled.");
            return Ok(());
        }
    }

    // 从已有条目出发,未提到的多余字段原样保留
    let mut service = config
        .services
        .get(desc.name)
        .cloned()
        .unwrap_or_default();

    for spec in desc.fields {
        let existing = service.field_str(spec.key);
        let value = if spec.secret {
            prompt_secret(spec, existing)?
        } else {
            prompt_plain(spec, existing)?
        };

        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        service.set_field(spec.key, value);
    }

    // 整体校验,通不过就不落盘
    (desc.build)(&service)?;

    service.enabled = true;
    config.services.insert(desc.name.to_string(), service);
    store.save(user, &config)?;

    println!("✅ {} configured", desc.name);
    println!("   Run 'ipr test --user {}' to send a test notification", user);
    Ok(())
}

/// 密码输入;已有值时允许留空保持不变
fn prompt_secret(spec: &FieldSpec, existing: Option<String>) -> Result<String> {
    match existing {
        Some(current) => {
            let value = Password::new()
                .with_prompt(format!("{} (leave empty to keep current)", spec.label))
                .allow_empty_password(true)
                .interact()?;
            if value.is_empty() {
                Ok(current)
            } else {
                Ok(value)
            }
        }
        None => {
            let value = Password::new().with_prompt(spec.label).interact()?;
            Ok(value)
        }
    }
}

fn prompt_plain(spec: &FieldSpec, existing: Option<String>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(spec.label);

    if let Some(default) = field_default(existing, spec) {
        input = input.default(default);
    }
    if let Some(validate) = spec.validator {
        input = input.validate_with(move |value: &String| validate(value));
    }

    let value = input.interact_text()?;
    Ok(value)
}

/// 提示默认值:已配置的当前值优先,其次字段模式里的默认值
fn field_default(existing: Option<String>, spec: &FieldSpec) -> Option<String> {
    existing.or_else(|| spec.default.map(str::to_string))
}
