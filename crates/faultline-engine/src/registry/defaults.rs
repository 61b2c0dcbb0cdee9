//! Built-in registry content for the deployed HVAC fleet.

use super::{Comparison, FaultDefinition, FaultFamily, LifeRule, ThresholdRule};

pub(super) const DEFAULT_VERSION: u32 = 1;

/// (family name, field prefix)
const FAMILIES: &[(&str, &str)] = &[
    ("generic", "Bflt"),
    ("low_pressure", "Blp"),
    ("short_circuit", "Bsc"),
    ("over_current", "Boc"),
];

/// (field, event code, display name, level)
const FAULTS: &[(&str, &str, &str, i64)] = &[
    // Power supply and cabin environment
    ("BfltPowersupplyU1", "bflt_powersupply_u1", "Unit 1 power supply fault", 1),
    ("BfltPowersupplyU2", "bflt_powersupply_u2", "Unit 2 power supply fault", 1),
    ("BfltTempover", "bflt_tempover", "Cabin over-temperature", 1),
    ("BfltEmergivt", "bflt_emergivt", "Emergency ventilation fault", 1),
    // Compressor pressure circuit
    ("BlpfltCompU11", "blpflt_comp_u11", "Low pressure fault U1-1", 2),
    ("BlpfltCompU12", "blpflt_comp_u12", "Low pressure fault U1-2", 2),
    ("BlpfltCompU21", "blpflt_comp_u21", "Low pressure fault U2-1", 2),
    ("BlpfltCompU22", "blpflt_comp_u22", "Low pressure fault U2-2", 2),
    ("BscfltCompU11", "bscflt_comp_u11", "High pressure fault U1-1", 2),
    ("BscfltCompU12", "bscflt_comp_u12", "High pressure fault U1-2", 2),
    ("BscfltCompU21", "bscflt_comp_u21", "High pressure fault U2-1", 2),
    ("BscfltCompU22", "bscflt_comp_u22", "High pressure fault U2-2", 2),
    ("BfltHighpresU11", "bflt_highpres_u11", "High pressure protection U1-1", 2),
    ("BfltHighpresU12", "bflt_highpres_u12", "High pressure protection U1-2", 2),
    ("BfltHighpresU21", "bflt_highpres_u21", "High pressure protection U2-1", 2),
    ("BfltHighpresU22", "bflt_highpres_u22", "High pressure protection U2-2", 2),
    ("BfltLowpresU11", "bflt_lowpres_u11", "Low pressure protection U1-1", 2),
    ("BfltLowpresU12", "bflt_lowpres_u12", "Low pressure protection U1-2", 2),
    ("BfltLowpresU21", "bflt_lowpres_u21", "Low pressure protection U2-1", 2),
    ("BfltLowpresU22", "bflt_lowpres_u22", "Low pressure protection U2-2", 2),
    // Inverters and fans
    ("BfltVfdU11", "bflt_vfd_u11", "Inverter fault U1-1", 2),
    ("BfltVfdU12", "bflt_vfd_u12", "Inverter fault U1-2", 2),
    ("BfltVfdU21", "bflt_vfd_u21", "Inverter fault U2-1", 2),
    ("BfltVfdU22", "bflt_vfd_u22", "Inverter fault U2-2", 2),
    ("BfltVfdComU11", "bflt_vfd_com_u11", "Inverter communication fault U1-1", 2),
    ("BfltVfdComU12", "bflt_vfd_com_u12", "Inverter communication fault U1-2", 2),
    ("BfltVfdComU21", "bflt_vfd_com_u21", "Inverter communication fault U2-1", 2),
    ("BfltVfdComU22", "bflt_vfd_com_u22", "Inverter communication fault U2-2", 2),
    ("BocfltEfU11", "bocflt_ef_u11", "Ventilation fan over-current U1-1", 2),
    ("BocfltEfU12", "bocflt_ef_u12", "Ventilation fan over-current U1-2", 2),
    ("BocfltEfU21", "bocflt_ef_u21", "Ventilation fan over-current U2-1", 2),
    ("BocfltEfU22", "bocflt_ef_u22", "Ventilation fan over-current U2-2", 2),
    ("BocfltCfU11", "bocflt_cf_u11", "Condenser fan over-current U1-1", 2),
    ("BocfltCfU12", "bocflt_cf_u12", "Condenser fan over-current U1-2", 2),
    ("BocfltCfU21", "bocflt_cf_u21", "Condenser fan over-current U2-1", 2),
    ("BocfltCfU22", "bocflt_cf_u22", "Condenser fan over-current U2-2", 2),
    ("BscfltVentU11", "bscflt_vent_u11", "Ventilation fault U1-1", 2),
    ("BscfltVentU12", "bscflt_vent_u12", "Ventilation fault U1-2", 2),
    ("BscfltVentU21", "bscflt_vent_u21", "Ventilation fault U2-1", 2),
    ("BscfltVentU22", "bscflt_vent_u22", "Ventilation fault U2-2", 2),
    ("BfltExhaustfan", "bflt_exhaustfan", "Exhaust fan fault", 2),
    // Dampers
    ("BfltFadU11", "bflt_fad_u11", "Fresh-air damper fault U1-1", 2),
    ("BfltFadU12", "bflt_fad_u12", "Fresh-air damper fault U1-2", 2),
    ("BfltFadU21", "bflt_fad_u21", "Fresh-air damper fault U2-1", 2),
    ("BfltFadU22", "bflt_fad_u22", "Fresh-air damper fault U2-2", 2),
    ("BfltRadU11", "bflt_rad_u11", "Return-air damper fault U1-1", 2),
    ("BfltRadU12", "bflt_rad_u12", "Return-air damper fault U1-2", 2),
    ("BfltRadU21", "bflt_rad_u21", "Return-air damper fault U2-1", 2),
    ("BfltRadU22", "bflt_rad_u22", "Return-air damper fault U2-2", 2),
    ("BfltExhaustval", "bflt_exhaustval", "Exhaust damper fault", 2),
    // Sensors
    ("BfltDiffpresU1", "bflt_diffpres_u1", "Differential pressure sensor fault U1", 2),
    ("BfltDiffpresU2", "bflt_diffpres_u2", "Differential pressure sensor fault U2", 2),
    ("BfltAirmonU1", "bflt_airmon_u1", "Air quality sensor fault U1", 2),
    ("BfltAirmonU2", "bflt_airmon_u2", "Air quality sensor fault U2", 2),
    ("BfltCurrentmon", "bflt_currentmon", "Current monitor fault", 2),
    ("BfltVehtempU1", "bflt_vehtemp_u1", "Cabin temperature sensor fault U1", 2),
    ("BfltVehtempU2", "bflt_vehtemp_u2", "Cabin temperature sensor fault U2", 2),
    ("BfltRnttempU1", "bflt_rnttemp_u1", "Return-air temperature sensor fault U1", 2),
    ("BfltRnttempU2", "bflt_rnttemp_u2", "Return-air temperature sensor fault U2", 2),
    ("BfltFrstempU1", "bflt_frstemp_u1", "Frost temperature sensor fault U1", 2),
    ("BfltFrstempU2", "bflt_frstemp_u2", "Frost temperature sensor fault U2", 2),
    ("BfltCoiltempU11", "bflt_coiltemp_u11", "Coil temperature sensor fault U1-1", 2),
    ("BfltCoiltempU12", "bflt_coiltemp_u12", "Coil temperature sensor fault U1-2", 2),
    ("BfltCoiltempU21", "bflt_coiltemp_u21", "Coil temperature sensor fault U2-1", 2),
    ("BfltCoiltempU22", "bflt_coiltemp_u22", "Coil temperature sensor fault U2-2", 2),
    ("BfltSplytempU11", "bflt_splytemp_u11", "Supply-air temperature sensor fault U1-1", 2),
    ("BfltSplytempU12", "bflt_splytemp_u12", "Supply-air temperature sensor fault U1-2", 2),
    ("BfltSplytempU21", "bflt_splytemp_u21", "Supply-air temperature sensor fault U2-1", 2),
    ("BfltSplytempU22", "bflt_splytemp_u22", "Supply-air temperature sensor fault U2-2", 2),
    ("BfltInsptempU11", "bflt_insptemp_u11", "Suction temperature sensor fault U1-1", 2),
    ("BfltInsptempU12", "bflt_insptemp_u12", "Suction temperature sensor fault U1-2", 2),
    ("BfltInsptempU21", "bflt_insptemp_u21", "Suction temperature sensor fault U2-1", 2),
    ("BfltInsptempU22", "bflt_insptemp_u22", "Suction temperature sensor fault U2-2", 2),
    // Communication and accessories
    ("BfltTcms", "bflt_tcms", "TCMS communication fault", 2),
    ("BfltExpboardU1", "bflt_expboard_u1", "Expansion board communication fault U1", 2),
    ("BfltExpboardU2", "bflt_expboard_u2", "Expansion board communication fault U2", 2),
    ("BfltApU11", "bflt_ap_u11", "Air purifier fault U1-1", 2),
    ("BfltApU21", "bflt_ap_u21", "Air purifier fault U2-1", 2),
];

pub(super) fn families() -> Vec<FaultFamily> {
    FAMILIES
        .iter()
        .map(|(name, prefix)| FaultFamily {
            name: name.to_string(),
            prefix: prefix.to_string(),
        })
        .collect()
}

/// The built-in table. Each entry's family is the first family whose
/// prefix the field carries.
pub(super) fn faults(families: &[FaultFamily]) -> Vec<FaultDefinition> {
    FAULTS
        .iter()
        .map(|(field, code, name, level)| FaultDefinition {
            field: field.to_string(),
            code: code.to_string(),
            family: families
                .iter()
                .find(|f| f.matches(field))
                .map(|f| f.name.clone())
                .unwrap_or_default(),
            name: name.to_string(),
            level: *level,
        })
        .collect()
}

pub(super) fn thresholds() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule {
            code: "filter_pressure_differential".into(),
            name: "Filter pressure differential high".into(),
            fields: vec!["PresdiffU1".into(), "PresdiffU2".into()],
            comparison: Comparison::Gt,
            limit: 3_000.0,
        },
        ThresholdRule {
            code: "ventilation_fan_runtime".into(),
            name: "Ventilation fan approaching rated service life".into(),
            fields: vec!["DwefOpTmU11".into()],
            comparison: Comparison::Ge,
            limit: FAN_WARN_S,
        },
    ]
}

// Rated service life and the 75% / 90% tiers.
const FAN_RATED_S: f64 = 90_000_000.0;
const FAN_WARN_S: f64 = 67_500_000.0;
const FAN_CRIT_S: f64 = 81_000_000.0;
const COMPRESSOR_RATED_S: f64 = 180_000_000.0;
const COMPRESSOR_WARN_S: f64 = 135_000_000.0;
const COMPRESSOR_CRIT_S: f64 = 162_000_000.0;
const DAMPER_RATED_CYCLES: f64 = 1_000_000.0;
const DAMPER_WARN_CYCLES: f64 = 750_000.0;
const DAMPER_CRIT_CYCLES: f64 = 900_000.0;

#[derive(Clone, Copy)]
enum Component {
    Fan,
    Compressor,
    Damper,
}

impl Component {
    fn tiers(self) -> (f64, f64, f64) {
        match self {
            Self::Fan => (FAN_WARN_S, FAN_CRIT_S, FAN_RATED_S),
            Self::Compressor => (COMPRESSOR_WARN_S, COMPRESSOR_CRIT_S, COMPRESSOR_RATED_S),
            Self::Damper => (DAMPER_WARN_CYCLES, DAMPER_CRIT_CYCLES, DAMPER_RATED_CYCLES),
        }
    }
}

/// (field, code offset, component, name)
const LIFE: &[(&str, i64, Component, &str)] = &[
    ("DwefOpTmU11", 1, Component::Fan, "Unit 1 ventilation fan runtime"),
    ("DwcfOpTmU11", 2, Component::Fan, "Unit 1 condenser fan runtime"),
    ("DwcpOpTmU11", 3, Component::Compressor, "Unit 1 compressor 1 runtime"),
    ("DwcpOpTmU12", 4, Component::Compressor, "Unit 1 compressor 2 runtime"),
    ("DwfadOpCntU1", 5, Component::Damper, "Unit 1 fresh-air damper cycles"),
    ("DwradOpCntU1", 6, Component::Damper, "Unit 1 return-air damper cycles"),
    ("DwefOpTmU21", 11, Component::Fan, "Unit 2 ventilation fan runtime"),
    ("DwcfOpTmU21", 12, Component::Fan, "Unit 2 condenser fan runtime"),
    ("DwcpOpTmU21", 13, Component::Compressor, "Unit 2 compressor 1 runtime"),
    ("DwcpOpTmU22", 14, Component::Compressor, "Unit 2 compressor 2 runtime"),
    ("DwfadOpCntU2", 15, Component::Damper, "Unit 2 fresh-air damper cycles"),
    ("DwradOpCntU2", 16, Component::Damper, "Unit 2 return-air damper cycles"),
    ("DwexufanOpTm", 21, Component::Fan, "Exhaust fan runtime"),
    ("DwdmpexuOpCnt", 22, Component::Damper, "Exhaust damper cycles"),
];

pub(super) fn life_rules() -> Vec<LifeRule> {
    LIFE.iter()
        .map(|(field, offset, component, name)| {
            let (warn, crit, rated_limit) = component.tiers();
            LifeRule {
                field: field.to_string(),
                offset: *offset,
                name: name.to_string(),
                warn,
                crit,
                rated_limit,
            }
        })
        .collect()
}
