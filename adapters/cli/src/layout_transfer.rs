use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rampart_core::{TargetingStrategy, TowerKind, TowerSpawn, TowerUpgrades, Vec2};
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "rampart";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const SNAPSHOT_HEADER: &str = "rampart:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Tower placement shared between scenarios as a single-line string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerLayout {
    /// Number of terrain columns the layout was made for.
    pub(crate) columns: u32,
    /// Number of terrain rows the layout was made for.
    pub(crate) rows: u32,
    /// Towers composing the layout.
    pub(crate) towers: Vec<LayoutTower>,
}

impl TowerLayout {
    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json = serde_json::to_vec(&self.towers).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a layout from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let towers: Vec<LayoutTower> =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            towers,
        })
    }
}

/// Tower anchored to a terrain cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutTower {
    /// Kind of tower.
    pub(crate) kind: TowerKind,
    /// Target selection strategy.
    #[serde(default)]
    pub(crate) strategy: TargetingStrategy,
    /// Column of the cell the tower stands on.
    pub(crate) column: u32,
    /// Row of the cell the tower stands on.
    pub(crate) row: u32,
    /// Armor rating.
    #[serde(default)]
    pub(crate) armor: u32,
    /// Purchased upgrade levels.
    #[serde(default)]
    pub(crate) upgrades: TowerUpgrades,
}

impl LayoutTower {
    /// Spawn description placing the tower at the centre of its cell.
    pub(crate) fn spawn(&self, cell_size: f32) -> TowerSpawn {
        TowerSpawn {
            kind: self.kind,
            strategy: self.strategy,
            position: Vec2::new(
                (self.column as f32 + 0.5) * cell_size,
                (self.row as f32 + 0.5) * cell_size,
            ),
            armor: self.armor,
            upgrades: self.upgrades,
        }
    }
}

/// Errors that can occur while encoding or decoding layout strings.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded layout.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded layout did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded layout did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded layout did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded layout used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    #[error("could not convert layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populated_layout_survives_transfer() {
        let layout = TowerLayout {
            columns: 20,
            rows: 15,
            towers: vec![
                LayoutTower {
                    kind: TowerKind::Frost,
                    strategy: TargetingStrategy::First,
                    column: 5,
                    row: 7,
                    armor: 4,
                    upgrades: TowerUpgrades::default(),
                },
                LayoutTower {
                    kind: TowerKind::Sniper,
                    strategy: TargetingStrategy::Strongest,
                    column: 12,
                    row: 4,
                    armor: 0,
                    upgrades: TowerUpgrades {
                        damage: 2,
                        range: 1,
                        rate: 0,
                    },
                },
            ],
        };

        let encoded = layout.encode().expect("layout encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:20x15:")));

        let decoded = TowerLayout::decode(&encoded).expect("layout decodes");
        assert_eq!(layout, decoded);
    }

    #[test]
    fn rejects_foreign_prefix() {
        let error = TowerLayout::decode("citadel:v1:4x4:W10").expect_err("prefix rejected");
        assert!(matches!(error, LayoutTransferError::InvalidPrefix(prefix) if prefix == "citadel"));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let error = TowerLayout::decode("rampart:v1:0x4:W10").expect_err("dimensions rejected");
        assert!(matches!(error, LayoutTransferError::InvalidDimensions(_)));
    }

    #[test]
    fn towers_stand_on_cell_centres() {
        let tower = LayoutTower {
            kind: TowerKind::Basic,
            strategy: TargetingStrategy::Closest,
            column: 2,
            row: 3,
            armor: 0,
            upgrades: TowerUpgrades::default(),
        };
        assert_eq!(tower.spawn(10.0).position, Vec2::new(25.0, 35.0));
    }
}
