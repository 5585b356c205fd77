use crate::constants::*;
use crate::*;

/// Buy classification for a round. Pistol rounds are always full buys.
pub fn classify_buy(round: u32, equipment_value: i32, config: &ProcessorConfig) -> BuyType {
    if PISTOL_ROUNDS.contains(&round) {
        BuyType::FullBuy
    } else if equipment_value < config.eco_threshold {
        BuyType::Eco
    } else if equipment_value < config.full_buy_threshold {
        BuyType::ForceBuy
    } else {
        BuyType::FullBuy
    }
}

/// Equipment value from the player's latest gunfight snapshot of the round,
/// falling back to the last value observed on a live handle.
pub fn round_equipment_value(
    gunfights: &[&GunfightEvent],
    player_id: PlayerId,
    fallback: i32,
) -> i32 {
    gunfights
        .iter()
        .rev()
        .find_map(|gunfight| {
            if gunfight.player1.id == player_id {
                Some(gunfight.player1.equipment_value)
            } else if gunfight.player2.id == player_id {
                Some(gunfight.player2.equipment_value)
            } else {
                None
            }
        })
        .unwrap_or(fallback)
}
