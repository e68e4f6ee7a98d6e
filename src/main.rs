//! IRC Push Relay CLI
//!
//! 配置通知服务、维护过滤规则、发送测试通知。消息本身由宿主
//! 聊天程序经 `EventBridge` 送进来,这个二进制只是操作面。

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use irc_push_relay::{
    build_notifiers, cli::SetupArgs, ConfigError, ConfigStore, DeliveryLog, FilterSettings,
    NotificationRouter,
};

#[derive(Parser)]
#[command(name = "ipr")]
#[command(about = "IRC push relay - 把重要的 IRC 消息转发到推送服务")]
#[command(version)]
struct Cli {
    /// 配置身份（每个身份一个配置文件）
    #[arg(long, global = true, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 查看当前配置与最近的推送记录
    Status,
    /// 打开通知总开关
    Enable,
    /// 关闭通知总开关
    Disable,
    /// 交互式配置通知服务
    Setup(SetupArgs),
    /// 发送测试通知（绕过过滤与去重）
    Test,
    /// 添加一个过滤关键字
    AddKeyword {
        /// 关键字
        word: String,
    },
    /// 移除一个过滤关键字
    RemoveKeyword {
        /// 关键字
        word: String,
    },
    /// 写入单个配置键
    Config {
        /// "filters" 或服务名
        target: String,
        /// 键名
        key: String,
        /// 新值
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("irc_push_relay=info,ipr=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let store = ConfigStore::open_default();
    let user = cli.user;

    match cli.command {
        Commands::Status => {
            let config = store.load(&user);
            let recent = DeliveryLog::new(store.history_path()).read_recent(5);
            print!(
                "{}",
                irc_push_relay::cli::render_status(&user, &config, &recent)
            );
        }
        Commands::Enable => {
            let mut config = store.load(&user);
            if config.services.is_empty() {
                eprintln!("❌ {}", ConfigError::NoServicesConfigured);
                eprintln!("   Run 'ipr setup pushover' first");
                std::process::exit(1);
            }
            config.enabled = true;
            store.save(&user, &config)?;
            println!("✅ notifications enabled for '{}'", user);
        }
        Commands::Disable => {
            let mut config = store.load(&user);
            config.enabled = false;
            store.save(&user, &config)?;
            println!("✅ notifications disabled for '{}'", user);
        }
        Commands::Setup(args) => {
            irc_push_relay::cli::handle_setup(&store, &user, &args)?;
        }
        Commands::Test => {
            let config = store.load(&user);
            let notifiers = build_notifiers(&config);
            if notifiers.is_empty() {
                eprintln!("❌ no usable notification services");
                eprintln!("   Run 'ipr setup pushover' or check 'ipr status'");
                std::process::exit(1);
            }

            // 测试通知不走过滤,router 只承担分发
            let router = NotificationRouter::new("", FilterSettings::default(), notifiers);
            let mut failed = false;
            for (service, result) in router.send_test_notification().await {
                match result {
                    Ok(()) => println!("✅ {}", service),
                    Err(e) => {
                        failed = true;
                        eprintln!("❌ {}", e);
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }
        Commands::AddKeyword { word } => {
            let word = word.trim().to_string();
            if word.is_empty() {
                eprintln!("❌ keyword is empty");
                std::process::exit(1);
            }
            let mut config = store.load(&user);
            if config.add_keyword(&word) {
                store.save(&user, &config)?;
                println!("✅ keyword '{}' added", word);
            } else {
                println!("keyword '{}' already present", word);
            }
        }
        Commands::RemoveKeyword { word } => {
            let mut config = store.load(&user);
            if config.remove_keyword(&word) {
                store.save(&user, &config)?;
                println!("✅ keyword '{}' removed", word);
            } else {
                println!("keyword '{}' not found", word);
            }
        }
        Commands::Config { target, key, value } => {
            let mut config = store.load(&user);
            match irc_push_relay::cli::apply_setting(&mut config, &target, &key, &value) {
                Ok(summary) => {
                    store.save(&user, &config)?;
                    println!("✅ {}", summary);
                }
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
