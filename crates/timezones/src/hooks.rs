use bitflags::bitflags;

bitflags! {
    /// Host callbacks the plugin currently listens to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Hooks: u8 {
        const SERVER_SAVE = 1 << 0;
        const ENTER_ZONE = 1 << 1;
        const EXIT_ZONE = 1 << 2;
        const NETWORK_TIME = 1 << 3;
        const PLAYER_INIT = 1 << 4;
    }
}

impl Hooks {
    /// Hooks that are useless without a zone provider.
    pub const ZONE_DEPENDENT: Self = Self::all();

    /// Subscriptions right after init; `NETWORK_TIME` waits for a player.
    pub fn initial() -> Self {
        Self::all().difference(Self::NETWORK_TIME)
    }
}
