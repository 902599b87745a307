use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use savings_backend::{
    AppResult,
    config::Config,
    database::{create_pool, run_migrations},
    models::*,
    services::*,
};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    if let Err(e) = run().await {
        e.log();
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    // 加载配置
    let config = Config::from_toml()?;

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;

    // 运行数据库迁移
    let applied = run_migrations(&pool).await?;
    log::info!("Database ready, {} migration(s) applied", applied);

    let isolation = config.database.isolation();
    let users = UserService::new(pool.clone(), &config.security).with_isolation(isolation);
    let balances = BalanceService::new(pool.clone()).with_isolation(isolation);
    let withdrawals = WithdrawalService::new(pool.clone());
    let deposits = DepositService::new(pool.clone());
    let reward_rates = RewardRateService::new(pool.clone()).with_isolation(isolation);
    let non_reward_days = NonRewardDayService::new(pool.clone());
    let notifications = NotificationService::new(pool.clone());
    let fcm_tokens = FcmTokenService::new(pool.clone()).with_isolation(isolation);

    log::info!(
        "Row counts: users={} balances={} withdrawals={} deposits={} reward_rates={} non_reward_days={} notifications={} fcm_tokens={}",
        users.count(&UserFilter::default()).await?,
        balances.count(&BalanceFilter::default()).await?,
        withdrawals.count(&WithdrawalFilter::default()).await?,
        deposits.count(&DepositFilter::default()).await?,
        reward_rates.count().await?,
        non_reward_days.count(&NonRewardDayFilter::default()).await?,
        notifications.count(&NotificationFilter::default()).await?,
        fcm_tokens.count(&FcmTokenFilter::default()).await?,
    );

    let totals = balances.aggregate(&BalanceFilter::default()).await?;
    log::info!(
        "Balance totals: balance={} pending={} reward={}",
        totals.balance,
        totals.pending_balance,
        totals.reward_balance
    );

    Ok(())
}
