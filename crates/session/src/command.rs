//! Menu commands that act on the hat a user is wearing

use crate::stage::Vec3;

/// Position step for move commands
pub const MOVE_STEP: f64 = 0.01;

/// Scale step for size commands
pub const SIZE_STEP: f64 = 0.02;

/// Command entry in the hat menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatCommand {
    Clear,
    MoveUp,
    MoveDown,
    MoveForward,
    MoveBack,
    SizeUp,
    SizeDown,
}

impl HatCommand {
    /// Every command, in menu order
    pub const ALL: &'static [HatCommand] = &[
        HatCommand::Clear,
        HatCommand::MoveUp,
        HatCommand::MoveDown,
        HatCommand::MoveForward,
        HatCommand::MoveBack,
        HatCommand::SizeUp,
        HatCommand::SizeDown,
    ];

    /// Catalog id of the command
    pub fn id(&self) -> &'static str {
        match self {
            HatCommand::Clear => "clear!",
            HatCommand::MoveUp => "moveup!",
            HatCommand::MoveDown => "movedown!",
            HatCommand::MoveForward => "moveforward!",
            HatCommand::MoveBack => "moveback!",
            HatCommand::SizeUp => "sizeup!",
            HatCommand::SizeDown => "sizedown!",
        }
    }

    /// Parse a menu id; hats return `None`
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|command| command.id() == id)
    }

    /// Apply a move or size command to a local transform
    ///
    /// `Clear` leaves the transform unchanged; the caller removes the hat.
    pub fn adjust(&self, position: &mut Vec3, scale: &mut Vec3) {
        match self {
            HatCommand::Clear => {}
            HatCommand::MoveUp => position.y += MOVE_STEP,
            HatCommand::MoveDown => position.y -= MOVE_STEP,
            HatCommand::MoveForward => position.z += MOVE_STEP,
            HatCommand::MoveBack => position.z -= MOVE_STEP,
            HatCommand::SizeUp => {
                scale.x += SIZE_STEP;
                scale.y += SIZE_STEP;
                scale.z += SIZE_STEP;
            }
            HatCommand::SizeDown => {
                scale.x -= SIZE_STEP;
                scale.y -= SIZE_STEP;
                scale.z -= SIZE_STEP;
            }
        }
    }
}
