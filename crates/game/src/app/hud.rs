use ninja_engine::{Color, DrawList, Rect, SCREEN_WIDTH};

use super::actors::NinjaStats;

const PANEL_WIDTH: f32 = 80.0;
const MARGIN: f32 = 4.0;
const BAR_HEIGHT: f32 = 3.0;
const BAR_GAP: f32 = 2.0;
const LIFE_PIP: f32 = 3.0;
const TIMER_DIGIT_WIDTH: f32 = 4.0;

const BAR_BACK: Color = Color::rgb(0x20, 0x20, 0x20);
const HP_COLOR: Color = Color::rgb(0xd0, 0x30, 0x30);
const MANA_COLOR: Color = Color::rgb(0x30, 0x60, 0xe0);
const LIFE_COLOR: Color = Color::rgb(0xf0, 0xf0, 0xf0);
const TIMER_COLOR: Color = Color::rgb(0xf0, 0xd0, 0x40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlayerHud {
    pub(crate) slot: usize,
    pub(crate) stats: NinjaStats,
    pub(crate) active: bool,
}

/// What the HUD shows this frame, published by the segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HudSnapshot {
    pub(crate) players: Vec<PlayerHud>,
    pub(crate) remaining_seconds: u64,
}

/// Filled portion of a bar `full_width` wide.
fn fill_width(value: i32, max: i32, full_width: f32) -> f32 {
    if max <= 0 {
        return 0.0;
    }
    let ratio = value.clamp(0, max) as f32 / max as f32;
    full_width * ratio
}

impl HudSnapshot {
    /// One panel per player along the top edge, the timer at the top right.
    pub(crate) fn render(&self, draw: &mut DrawList) {
        for player in &self.players {
            let left = MARGIN + player.slot as f32 * (PANEL_WIDTH + MARGIN);
            let stats = player.stats;
            let bar_width = PANEL_WIDTH - MARGIN;

            let hp_row = Rect::new(left, MARGIN, bar_width, BAR_HEIGHT);
            draw.hud_rect(hp_row, BAR_BACK);
            let hp = fill_width(stats.hp, stats.max_hp, bar_width);
            if hp > 0.0 {
                draw.hud_rect(Rect::new(left, MARGIN, hp, BAR_HEIGHT), HP_COLOR);
            }

            let mana_top = MARGIN + BAR_HEIGHT + BAR_GAP;
            draw.hud_rect(Rect::new(left, mana_top, bar_width, BAR_HEIGHT), BAR_BACK);
            let mana = fill_width(stats.mana, stats.max_mana, bar_width);
            if mana > 0.0 {
                draw.hud_rect(Rect::new(left, mana_top, mana, BAR_HEIGHT), MANA_COLOR);
            }

            let lives_top = mana_top + BAR_HEIGHT + BAR_GAP;
            for life in 0..stats.lives.max(0) {
                let x = left + life as f32 * (LIFE_PIP + 1.0);
                draw.hud_rect(Rect::new(x, lives_top, LIFE_PIP, LIFE_PIP), LIFE_COLOR);
            }
        }

        // one tick per remaining ten seconds
        let ticks = self.remaining_seconds.div_ceil(10) as f32;
        let width = ticks * TIMER_DIGIT_WIDTH;
        draw.hud_rect(
            Rect::new(SCREEN_WIDTH - MARGIN - width, MARGIN, width, BAR_HEIGHT),
            TIMER_COLOR,
        );
    }
}
