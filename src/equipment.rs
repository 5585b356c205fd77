use crate::constants::*;
use crate::*;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
pub enum WeaponCategory {
    Pistol,
    Smg,
    Heavy,
    Rifle,
    Sniper,
    Grenade,
    Equipment,
    Other,
}

/// Coarse grouping used to pick a grenade scoring function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
pub enum GrenadeCategory {
    Flash,
    Explosive,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
pub enum GrenadeKind {
    Flashbang,
    HighExplosive,
    Smoke,
    Molotov,
    Incendiary,
    Decoy,
}

impl GrenadeKind {
    pub fn category(&self) -> GrenadeCategory {
        match self {
            GrenadeKind::Flashbang => GrenadeCategory::Flash,
            GrenadeKind::HighExplosive | GrenadeKind::Molotov | GrenadeKind::Incendiary => {
                GrenadeCategory::Explosive
            }
            GrenadeKind::Smoke | GrenadeKind::Decoy => GrenadeCategory::Utility,
        }
    }

    pub fn weapon(&self) -> Weapon {
        match self {
            GrenadeKind::Flashbang => Weapon::Flashbang,
            GrenadeKind::HighExplosive => Weapon::HeGrenade,
            GrenadeKind::Smoke => Weapon::SmokeGrenade,
            GrenadeKind::Molotov => Weapon::Molotov,
            GrenadeKind::Incendiary => Weapon::Incendiary,
            GrenadeKind::Decoy => Weapon::Decoy,
        }
    }

    /// Whether a damage event dealt with `weapon` can originate from this
    /// grenade. Fire damage is reported as the inferno, not the bottle.
    pub fn matches_damage_weapon(&self, weapon: Weapon) -> bool {
        match self {
            GrenadeKind::HighExplosive => weapon == Weapon::HeGrenade,
            GrenadeKind::Molotov | GrenadeKind::Incendiary => matches!(
                weapon,
                Weapon::Inferno | Weapon::Molotov | Weapon::Incendiary
            ),
            GrenadeKind::Flashbang | GrenadeKind::Smoke | GrenadeKind::Decoy => false,
        }
    }
}

macro_rules! weapon_table {
    ($($variant:ident => $price:expr, $category:ident, [$($alias:literal),* $(,)?]);* $(;)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
        pub enum Weapon {
            $($variant,)*
            Unknown,
        }

        impl Weapon {
            pub const ALL: &'static [Weapon] = &[$(Weapon::$variant,)*];

            pub fn price(&self) -> i32 {
                match self {
                    $(Weapon::$variant => $price,)*
                    Weapon::Unknown => 0,
                }
            }

            pub fn category(&self) -> WeaponCategory {
                match self {
                    $(Weapon::$variant => WeaponCategory::$category,)*
                    Weapon::Unknown => WeaponCategory::Other,
                }
            }

            fn from_normalized(name: &str) -> Weapon {
                match name {
                    $($($alias)|* => Weapon::$variant,)*
                    _ => Weapon::Unknown,
                }
            }
        }
    };
}

weapon_table! {
    Glock => 200, Pistol, ["glock", "glock18"];
    UspS => 200, Pistol, ["usps", "uspsilencer", "usp"];
    P2000 => 200, Pistol, ["p2000", "hkp2000"];
    P250 => 300, Pistol, ["p250"];
    FiveSeven => 500, Pistol, ["fiveseven"];
    Tec9 => 500, Pistol, ["tec9"];
    Cz75 => 500, Pistol, ["cz75", "cz75a", "cz75auto"];
    DualBerettas => 300, Pistol, ["dualberettas", "elite"];
    Deagle => 700, Pistol, ["deagle", "deserteagle"];
    R8Revolver => 600, Pistol, ["r8revolver", "revolver", "r8"];
    Mac10 => 1050, Smg, ["mac10"];
    Mp9 => 1250, Smg, ["mp9"];
    Mp7 => 1500, Smg, ["mp7"];
    Mp5Sd => 1500, Smg, ["mp5sd", "mp5"];
    Ump45 => 1200, Smg, ["ump45", "ump"];
    P90 => 2350, Smg, ["p90"];
    PpBizon => 1400, Smg, ["ppbizon", "bizon"];
    Nova => 1050, Heavy, ["nova"];
    Xm1014 => 2000, Heavy, ["xm1014"];
    SawedOff => 1100, Heavy, ["sawedoff"];
    Mag7 => 1300, Heavy, ["mag7"];
    M249 => 5200, Heavy, ["m249"];
    Negev => 1700, Heavy, ["negev"];
    Famas => 2050, Rifle, ["famas"];
    Galil => 1800, Rifle, ["galil", "galilar"];
    M4a4 => 3100, Rifle, ["m4a4", "m4a1"];
    M4a1S => 2900, Rifle, ["m4a1s", "m4a1silencer"];
    Ak47 => 2700, Rifle, ["ak47"];
    Aug => 3300, Rifle, ["aug"];
    Sg553 => 3000, Rifle, ["sg553", "sg556"];
    Ssg08 => 1700, Sniper, ["ssg08", "scout"];
    Awp => 4750, Sniper, ["awp"];
    G3sg1 => 5000, Sniper, ["g3sg1"];
    Scar20 => 5000, Sniper, ["scar20"];
    Flashbang => 200, Grenade, ["flashbang", "flash"];
    HeGrenade => 300, Grenade, ["hegrenade", "he", "highexplosivegrenade"];
    SmokeGrenade => 300, Grenade, ["smokegrenade", "smoke"];
    Molotov => 400, Grenade, ["molotov", "molotovgrenade"];
    Incendiary => 500, Grenade, ["incendiary", "incgrenade", "incendiarygrenade"];
    Decoy => 50, Grenade, ["decoy", "decoygrenade"];
    Knife => 0, Equipment, ["knife", "bayonet"];
    Zeus => 200, Equipment, ["zeus", "zeusx27", "taser"];
    C4 => 0, Equipment, ["c4", "c4explosive", "bomb"];
    Inferno => 0, Other, ["inferno", "fire"];
    World => 0, Other, ["world", "worldspawn"];
}

impl Weapon {
    /// Normalises decoder weapon names: `"weapon_ak47"`, `"AK-47"` and
    /// `"ak47"` all map to [`Weapon::Ak47`].
    pub fn from_name(name: &str) -> Weapon {
        let lowered = name.trim().to_ascii_lowercase();
        let stripped = lowered.strip_prefix("weapon_").unwrap_or(&lowered);
        let normalized: String = stripped
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if normalized.starts_with("knife") {
            return Weapon::Knife;
        }
        Weapon::from_normalized(&normalized)
    }

    pub fn grenade_kind(&self) -> Option<GrenadeKind> {
        match self {
            Weapon::Flashbang => Some(GrenadeKind::Flashbang),
            Weapon::HeGrenade => Some(GrenadeKind::HighExplosive),
            Weapon::SmokeGrenade => Some(GrenadeKind::Smoke),
            Weapon::Molotov => Some(GrenadeKind::Molotov),
            Weapon::Incendiary => Some(GrenadeKind::Incendiary),
            Weapon::Decoy => Some(GrenadeKind::Decoy),
            _ => None,
        }
    }

    pub fn is_grenade(&self) -> bool {
        self.grenade_kind().is_some()
    }

    /// Weapons whose damage is dealt by a bullet and therefore counts as a
    /// hit for accuracy.
    pub fn is_firearm(&self) -> bool {
        matches!(
            self.category(),
            WeaponCategory::Pistol
                | WeaponCategory::Smg
                | WeaponCategory::Heavy
                | WeaponCategory::Rifle
                | WeaponCategory::Sniper
        )
    }
}

impl<'de> Deserialize<'de> for Weapon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Weapon::from_name(&name))
    }
}

impl std::str::FromStr for Weapon {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Weapon::from_name(s))
    }
}

pub fn armor_value(armor: i32, has_helmet: bool) -> i32 {
    match (armor > 0, has_helmet) {
        (false, _) => 0,
        (true, false) => KEVLAR_VALUE,
        (true, true) => KEVLAR_VALUE + HELMET_VALUE,
    }
}

/// Total buy value carried by a player: inventory, armor and kit.
pub fn equipment_value(handle: &PlayerHandle) -> i32 {
    let inventory: i32 = handle.inventory.iter().map(Weapon::price).sum();
    let kit = if handle.has_defuse_kit {
        DEFUSE_KIT_VALUE
    } else {
        0
    };
    inventory + armor_value(handle.armor, handle.has_helmet) + kit
}

pub fn grenade_value(inventory: &[Weapon]) -> i32 {
    inventory
        .iter()
        .filter(|weapon| weapon.is_grenade())
        .map(Weapon::price)
        .sum()
}
