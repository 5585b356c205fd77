pub static DEFAULT_TICK_RATE: f64 = 64.0;

pub static TEAM_SIZE: usize = 5;
pub static REGULATION_ROUNDS: u32 = 24;
pub static HALFTIME_SWAP_ROUND: u32 = 13;
pub static OVERTIME_HALF_LENGTH: u32 = 3;
pub static PISTOL_ROUNDS: [u32; 2] = [1, HALFTIME_SWAP_ROUND];

pub static TEAM_A_LABEL: &str = "A";
pub static TEAM_B_LABEL: &str = "B";

pub static FLASH_ATTRIBUTION_WINDOW_SECONDS: f64 = 4.5;
pub static DAMAGE_ASSIST_THRESHOLD: i32 = 41;
pub static TRADE_DISTANCE: f32 = 1000.0;
pub static TRADE_WINDOW_SECONDS: f64 = 5.0;

pub static ECO_THRESHOLD: i32 = 1500;
pub static FULL_BUY_THRESHOLD: i32 = 3500;

pub static MAX_TIME_TO_CONTACT_SECONDS: f64 = 120.0;

pub static HE_DAMAGE_WINDOW_SECONDS: f64 = 1.0;
pub static FIRE_DAMAGE_WINDOW_SECONDS: f64 = 8.0;

pub static GRENADE_POINTS_PER_THROW: f64 = 10.0;
pub static GRENADE_SURVIVAL_POINTS: f64 = 20.0;
pub static GRENADE_VALUE_LOSS_CAP: f64 = 1000.0;
pub static MAX_GRENADE_EFFECTIVENESS: f64 = 100.0;
pub static EXPLOSIVE_DAMAGE_FOR_MAX_RATING: f64 = 150.0;

pub static BASE_PLAYER_VALUE: f64 = 1000.0;
pub static MAN_COUNT_WEIGHT: f64 = 1.0;
pub static EQUIPMENT_WEIGHT: f64 = 0.2;
pub static MAX_PLAYER_EQUIPMENT_VALUE: f64 = 8000.0;
pub static STRENGTH_DIFF_MULTIPLIER: f64 = 0.5;
pub static BASE_KILL_IMPACT: f64 = 100.0;
pub static FIRST_KILL_MULTIPLIER: f64 = 1.5;
pub static WON_CLUTCH_MULTIPLIER: f64 = 2.0;
pub static FAILED_CLUTCH_MULTIPLIER: f64 = 1.2;
pub static STANDARD_MULTIPLIER: f64 = 1.0;
pub static ASSIST_IMPACT_FRACTION: f64 = 0.35;
pub static FLASH_ASSIST_IMPACT_FRACTION: f64 = 0.2;

pub static KEVLAR_VALUE: i32 = 650;
pub static HELMET_VALUE: i32 = 350;
pub static DEFUSE_KIT_VALUE: i32 = 400;

pub static RUN_SPEED_THRESHOLD: f32 = 150.0;
pub static MOVING_SPEED_THRESHOLD: f32 = 10.0;

pub static DEFAULT_BATCH_SIZE: usize = 100;
pub static DEFAULT_DELIVERY_ATTEMPTS: u32 = 3;
pub static DEFAULT_DELIVERY_DELAY_MILLIS: u64 = 2000;
