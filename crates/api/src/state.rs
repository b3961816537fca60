use buddyperks_config::Settings;
use buddyperks_services::{
    AccountService, ApprovalService, AuthService, InventoryService, Notifier, RedemptionEngine,
    ReportingService,
    dao::{
        inventory::InventoryDao, redemption::RedemptionDao, registration::RegistrationDao,
        user::UserDao,
    },
    notify::{HttpMailer, LogMailer, Mailer},
};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub inventory: Arc<InventoryService>,
    pub redemptions: Arc<RedemptionEngine>,
    pub approvals: Arc<ApprovalService>,
    pub accounts: Arc<AccountService>,
    pub reporting: Arc<ReportingService>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let mailer: Arc<dyn Mailer> = match &settings.notifications.mail_relay_url {
            Some(url) => Arc::new(HttpMailer::new(url.clone())),
            None => Arc::new(LogMailer),
        };
        Self::with_mailer(db, settings, mailer)
    }

    pub fn with_mailer(db: Database, settings: Settings, mailer: Arc<dyn Mailer>) -> Self {
        let notifier = Notifier::spawn(
            mailer,
            settings.notifications.from_address.clone(),
            settings.notifications.queue_capacity,
        );

        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let items = Arc::new(InventoryDao::new(&db));
        let facts = Arc::new(RedemptionDao::new(&db));
        let requests = Arc::new(RegistrationDao::new(&db));

        let inventory = Arc::new(InventoryService::new(items.clone()));
        let redemptions = Arc::new(RedemptionEngine::new(
            items.clone(),
            facts.clone(),
            users.clone(),
            &settings.redemption,
        ));
        let approvals = Arc::new(ApprovalService::new(
            requests.clone(),
            users.clone(),
            auth.clone(),
            notifier.clone(),
            settings.redemption.default_buddy_credit,
        ));
        let accounts = Arc::new(AccountService::new(users.clone(), notifier.clone()));
        let reporting = Arc::new(ReportingService::new(
            items,
            facts,
            users.clone(),
            requests,
            &settings.redemption,
        ));

        Self {
            db,
            settings,
            auth,
            users,
            inventory,
            redemptions,
            approvals,
            accounts,
            reporting,
            notifier,
        }
    }
}
