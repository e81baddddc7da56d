//! Campaign event and intervention composers.
//!
//! Every composer builds schema-seeded class objects for the session's schema,
//! so writes are checked against the same enums and bounds the engine uses.
use super::distributions::Distribution;
use super::nodes::node_set;
use super::restrictions::{normalize, RestrictionInput};
use crate::campaign::{Campaign, CAMPAIGN_EVENT_CLASS, NO_TRIGGER};
use crate::dict::SchemaDict;
use crate::error::{ConfigError, Result};
use crate::schema::numeric_value;
use crate::util::number;

pub const BROADCAST_EVENT: &str = "BroadcastEvent";
pub const NODE_LEVEL_HEALTH_TRIGGERED_IV: &str = "NodeLevelHealthTriggeredIV";
pub const MULTI_INTERVENTION_DISTRIBUTOR: &str = "MultiInterventionDistributor";
pub const DELAYED_INTERVENTION: &str = "DelayedIntervention";
pub const PROPERTY_VALUE_CHANGER: &str = "PropertyValueChanger";
pub const STANDARD_DIAGNOSTIC: &str = "StandardDiagnostic";
pub const SIMPLE_DIAGNOSTIC: &str = "SimpleDiagnostic";
pub const EVENT_COORDINATOR: &str = "StandardInterventionDistributionEventCoordinator";

pub const DELAY_PREFIX: &str = "Delay_Period";
pub const POSITIVE_RESULT: &str = "PositiveResult";
pub const BIRTHS: &str = "Births";
pub const BLACKOUT: &str = "Blackout";
const ALL_GENDERS: &str = "All";

/// Who an event or listener reaches.
#[derive(Debug, Clone, PartialEq)]
pub struct Targeting {
    pub demographic_coverage: f64,
    pub target_age_min: Option<f64>,
    pub target_age_max: Option<f64>,
    pub target_gender: Option<String>,
    pub target_residents_only: bool,
    pub property_restrictions: RestrictionInput,
}

impl Default for Targeting {
    fn default() -> Self {
        Self {
            demographic_coverage: 1.0,
            target_age_min: None,
            target_age_max: None,
            target_gender: None,
            target_residents_only: false,
            property_restrictions: RestrictionInput::None,
        }
    }
}

/// Listener blackout controls; absent means no blackout.
#[derive(Debug, Clone, PartialEq)]
pub struct Blackout {
    pub event_trigger: String,
    pub on_first_occurrence: bool,
    pub period: f64,
}

#[derive(Debug, Clone)]
pub struct TriggeredIvArgs {
    pub triggers: Vec<String>,
    pub interventions: Vec<SchemaDict>,
    pub targeting: Targeting,
    pub duration: f64,
    pub blackout: Option<Blackout>,
    pub check_eligibility_at_trigger: bool,
}

impl Default for TriggeredIvArgs {
    fn default() -> Self {
        Self {
            triggers: Vec::new(),
            interventions: Vec::new(),
            targeting: Targeting::default(),
            duration: -1.0,
            blackout: None,
            check_eligibility_at_trigger: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledEventArgs {
    pub start_day: f64,
    pub node_ids: Vec<u32>,
    pub nodeset: Option<SchemaDict>,
    pub interventions: Vec<SchemaDict>,
    pub number_repetitions: i64,
    pub timesteps_between_repetitions: i64,
    pub targeting: Targeting,
}

impl Default for ScheduledEventArgs {
    fn default() -> Self {
        Self {
            start_day: 1.0,
            node_ids: Vec::new(),
            nodeset: None,
            interventions: Vec::new(),
            number_repetitions: 1,
            timesteps_between_repetitions: -1,
            targeting: Targeting::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggeredEventArgs {
    pub start_day: f64,
    pub event_name: String,
    pub node_ids: Vec<u32>,
    pub nodeset: Option<SchemaDict>,
    pub triggers: Vec<String>,
    pub interventions: Vec<SchemaDict>,
    pub number_repetitions: i64,
    pub timesteps_between_repetitions: i64,
    pub targeting: Targeting,
    pub duration: f64,
    pub blackout: Option<Blackout>,
    pub check_eligibility_at_trigger: bool,
    pub delay: Option<Distribution>,
}

impl Default for TriggeredEventArgs {
    fn default() -> Self {
        Self {
            start_day: 1.0,
            event_name: String::new(),
            node_ids: Vec::new(),
            nodeset: None,
            triggers: Vec::new(),
            interventions: Vec::new(),
            number_repetitions: 1,
            timesteps_between_repetitions: -1,
            targeting: Targeting::default(),
            duration: -1.0,
            blackout: None,
            check_eligibility_at_trigger: false,
            delay: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChangeArgs {
    pub target_property_key: String,
    pub target_property_value: String,
    pub new_property_value: String,
    pub daily_probability: f64,
    pub maximum_duration: f64,
    pub revert: f64,
}

impl Default for PropertyChangeArgs {
    fn default() -> Self {
        Self {
            target_property_key: String::new(),
            target_property_value: String::new(),
            new_property_value: String::new(),
            daily_probability: 1.0,
            maximum_duration: 1.0,
            revert: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiagnosticArgs {
    pub positive_diagnosis_event: Option<String>,
    pub positive_diagnosis_intervention: Option<SchemaDict>,
    pub event_trigger_distributed: Option<String>,
    pub event_trigger_expired: Option<String>,
    pub base_sensitivity: f64,
    pub base_specificity: f64,
    pub treatment_fraction: f64,
    pub days_to_diagnosis: f64,
}

impl Default for DiagnosticArgs {
    fn default() -> Self {
        Self {
            positive_diagnosis_event: None,
            positive_diagnosis_intervention: None,
            event_trigger_distributed: None,
            event_trigger_expired: None,
            base_sensitivity: 1.0,
            base_specificity: 1.0,
            treatment_fraction: 1.0,
            days_to_diagnosis: 0.0,
        }
    }
}

/// Arguments for the individual-property change helpers. Scheduled events use
/// the node/repetition fields; triggered ones use triggers, delay and listener fields.
#[derive(Debug, Clone)]
pub struct ChangePropertyArgs {
    pub property: PropertyChangeArgs,
    pub start_day: f64,
    pub node_ids: Vec<u32>,
    pub number_repetitions: i64,
    pub timesteps_between_repetitions: i64,
    pub targeting: Targeting,
    pub triggers: Vec<String>,
    pub delay: Option<Distribution>,
    pub listening_duration: f64,
    pub blackout: bool,
    pub check_eligibility_at_trigger: bool,
}

impl Default for ChangePropertyArgs {
    fn default() -> Self {
        Self {
            property: PropertyChangeArgs::default(),
            start_day: 1.0,
            node_ids: Vec::new(),
            number_repetitions: 1,
            timesteps_between_repetitions: -1,
            targeting: Targeting::default(),
            triggers: Vec::new(),
            delay: None,
            listening_duration: -1.0,
            blackout: false,
            check_eligibility_at_trigger: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeAtAgeArgs {
    pub new_ip_key: String,
    pub new_ip_value: String,
    pub change_age_in_days: f64,
    pub revert_in_days: f64,
    pub targeting: Targeting,
}

fn flag(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn new_object(campaign: &Campaign, class_name: &str) -> Result<SchemaDict> {
    let schema = campaign.schema()?;
    SchemaDict::for_class(&schema, class_name)
}

/// Broadcast `event_trigger` (mapped through the session's trigger table).
pub fn broadcast_event(campaign: &mut Campaign, event_trigger: &str) -> Result<SchemaDict> {
    let mut intervention = new_object(campaign, BROADCAST_EVENT)?;
    let mapped = campaign.map_trigger(event_trigger);
    intervention.set("Broadcast_Event", mapped)?;
    Ok(intervention)
}

pub fn multi_intervention_distributor(
    campaign: &mut Campaign,
    interventions: Vec<SchemaDict>,
) -> Result<SchemaDict> {
    let mut distributor = new_object(campaign, MULTI_INTERVENTION_DISTRIBUTOR)?;
    distributor.set_node("Intervention_List", interventions)?;
    Ok(distributor)
}

/// Wrap `interventions` so they are handed out after `delay`.
pub fn delayed_intervention(
    campaign: &mut Campaign,
    delay: &Distribution,
    interventions: Vec<SchemaDict>,
) -> Result<SchemaDict> {
    if interventions.is_empty() {
        return Err(ConfigError::InvalidArgument(
            "a delayed intervention needs at least one intervention".to_string(),
        ));
    }
    let mut delayed = new_object(campaign, DELAYED_INTERVENTION)?;
    delay.apply(&mut delayed, DELAY_PREFIX)?;
    delayed.set_node("Actual_IndividualIntervention_Configs", interventions)?;
    Ok(delayed)
}

pub fn property_value_changer(
    campaign: &mut Campaign,
    args: PropertyChangeArgs,
) -> Result<SchemaDict> {
    let mut changer = new_object(campaign, PROPERTY_VALUE_CHANGER)?;
    changer.set("Target_Property_Key", args.target_property_key)?;
    changer.set("Target_Property_Value", args.target_property_value)?;
    changer.set("New_Property_Value", args.new_property_value)?;
    changer.set("Daily_Probability", number(args.daily_probability))?;
    changer.set("Maximum_Duration", number(args.maximum_duration))?;
    changer.set("Revert", number(args.revert))?;
    Ok(changer)
}

/// Diagnostic whose positive result is either a broadcast (default
/// `PositiveResult`) or a caller-supplied intervention.
pub fn standard_diagnostic(campaign: &mut Campaign, args: DiagnosticArgs) -> Result<SchemaDict> {
    let positive_config = match (
        args.positive_diagnosis_event,
        args.positive_diagnosis_intervention,
    ) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::ConflictingArguments(
                "supply a positive diagnosis event or intervention, not both".to_string(),
            ))
        }
        (None, Some(intervention)) => intervention,
        (event, None) => broadcast_event(campaign, event.as_deref().unwrap_or(POSITIVE_RESULT))?,
    };

    let mut diagnostic = match new_object(campaign, STANDARD_DIAGNOSTIC) {
        Err(ConfigError::UnknownClass(_)) => new_object(campaign, SIMPLE_DIAGNOSTIC)?,
        other => other?,
    };
    diagnostic.set("Base_Sensitivity", number(args.base_sensitivity))?;
    diagnostic.set("Base_Specificity", number(args.base_specificity))?;
    diagnostic.set("Treatment_Fraction", number(args.treatment_fraction))?;
    diagnostic.set("Days_To_Diagnosis", number(args.days_to_diagnosis))?;
    if diagnostic.contains_key("Event_Or_Config") {
        diagnostic.set("Event_Or_Config", "Config")?;
    }
    diagnostic.set_node("Positive_Diagnosis_Config", positive_config)?;
    for (key, event) in [
        ("Event_Trigger_Distributed", args.event_trigger_distributed),
        ("Event_Trigger_Expired", args.event_trigger_expired),
    ] {
        if let Some(event) = event {
            let mapped = campaign.map_trigger(&event);
            diagnostic.set(key, mapped)?;
        }
    }
    Ok(diagnostic)
}

/// Listener that hands out its intervention(s) whenever one of `triggers` fires.
pub fn node_level_health_triggered_iv(
    campaign: &mut Campaign,
    args: TriggeredIvArgs,
) -> Result<SchemaDict> {
    if args.triggers.is_empty() {
        return Err(ConfigError::InvalidArgument(
            "a triggered intervention needs at least one trigger".to_string(),
        ));
    }
    let triggers: Vec<String> = args
        .triggers
        .iter()
        .map(|trigger| campaign.map_trigger(trigger))
        .collect();
    let actual = single_or_distributor(campaign, args.interventions)?;

    let mut listener = new_object(campaign, NODE_LEVEL_HEALTH_TRIGGERED_IV)?;
    listener.set("Trigger_Condition_List", triggers)?;
    listener.set_node("Actual_IndividualIntervention_Config", actual)?;
    apply_targeting(&mut listener, &args.targeting)?;
    listener.set("Duration", number(args.duration))?;
    listener.set(
        "Check_Eligibility_At_Trigger",
        flag(args.check_eligibility_at_trigger),
    )?;
    match args.blackout {
        Some(blackout) => {
            let mapped = campaign.map_trigger(&blackout.event_trigger);
            listener.set("Blackout_Event_Trigger", mapped)?;
            listener.set(
                "Blackout_On_First_Occurrence",
                flag(blackout.on_first_occurrence),
            )?;
            listener.set("Blackout_Period", number(blackout.period))?;
        }
        None => {
            listener.set("Blackout_Event_Trigger", NO_TRIGGER)?;
            listener.set("Blackout_On_First_Occurrence", 0)?;
            listener.set("Blackout_Period", 0)?;
        }
    }
    Ok(listener)
}

/// Event that distributes its interventions on `start_day`.
pub fn scheduled_campaign_event(
    campaign: &mut Campaign,
    args: ScheduledEventArgs,
) -> Result<SchemaDict> {
    let nodeset = resolve_nodeset(campaign, &args.node_ids, args.nodeset)?;
    let intervention = single_or_distributor(campaign, args.interventions)?;

    let mut coordinator = new_object(campaign, EVENT_COORDINATOR)?;
    coordinator.set("Number_Repetitions", args.number_repetitions)?;
    coordinator.set(
        "Timesteps_Between_Repetitions",
        args.timesteps_between_repetitions,
    )?;
    apply_targeting(&mut coordinator, &args.targeting)?;
    coordinator.set_node("Intervention_Config", intervention)?;

    campaign_event(campaign, args.start_day, None, nodeset, coordinator)
}

/// Event that installs a listener on `start_day`; the listener distributes the
/// interventions (optionally after a delay) whenever a trigger fires.
pub fn triggered_campaign_event(
    campaign: &mut Campaign,
    args: TriggeredEventArgs,
) -> Result<SchemaDict> {
    if args.event_name.is_empty() {
        return Err(ConfigError::InvalidArgument(
            "a triggered campaign event needs an event name".to_string(),
        ));
    }
    let nodeset = resolve_nodeset(campaign, &args.node_ids, args.nodeset)?;
    let interventions = match args.delay {
        Some(delay) => vec![delayed_intervention(campaign, &delay, args.interventions)?],
        None => args.interventions,
    };
    let listener = node_level_health_triggered_iv(
        campaign,
        TriggeredIvArgs {
            triggers: args.triggers,
            interventions,
            targeting: args.targeting,
            duration: args.duration,
            blackout: args.blackout,
            check_eligibility_at_trigger: args.check_eligibility_at_trigger,
        },
    )?;

    let mut coordinator = new_object(campaign, EVENT_COORDINATOR)?;
    coordinator.set("Number_Repetitions", args.number_repetitions)?;
    coordinator.set(
        "Timesteps_Between_Repetitions",
        args.timesteps_between_repetitions,
    )?;
    coordinator.set_node("Intervention_Config", listener)?;

    campaign_event(
        campaign,
        args.start_day,
        Some(&args.event_name),
        nodeset,
        coordinator,
    )
}

/// Listen for one trigger and distribute `interventions` after `delay`.
pub fn triggered_campaign_delay_event(
    campaign: &mut Campaign,
    start_day: f64,
    trigger: &str,
    delay: Distribution,
    interventions: Vec<SchemaDict>,
    targeting: Targeting,
) -> Result<SchemaDict> {
    triggered_campaign_event(
        campaign,
        TriggeredEventArgs {
            start_day,
            event_name: format!("Delayed_Event_On_{trigger}"),
            triggers: vec![trigger.to_string()],
            interventions,
            targeting,
            delay: Some(delay),
            ..TriggeredEventArgs::default()
        },
    )
}

/// `triggered_campaign_event` with a generated name when none is given.
pub fn triggered_campaign_event_with_optional_delay(
    campaign: &mut Campaign,
    mut args: TriggeredEventArgs,
) -> Result<SchemaDict> {
    if args.event_name.is_empty() {
        args.event_name = format!("Triggered_Event_On_{}", args.triggers.join("_"));
    }
    triggered_campaign_event(campaign, args)
}

/// At `change_age_in_days` after birth, switch an individual property.
pub fn change_individual_property_at_age(
    campaign: &mut Campaign,
    args: ChangeAtAgeArgs,
) -> Result<SchemaDict> {
    let changer = property_value_changer(
        campaign,
        PropertyChangeArgs {
            target_property_key: args.new_ip_key,
            target_property_value: args.new_ip_value,
            revert: args.revert_in_days,
            ..PropertyChangeArgs::default()
        },
    )?;
    triggered_campaign_event(
        campaign,
        TriggeredEventArgs {
            event_name: "Change_Individual_Property_At_Age".to_string(),
            triggers: vec![BIRTHS.to_string()],
            interventions: vec![changer],
            targeting: args.targeting,
            delay: Some(Distribution::Constant(args.change_age_in_days)),
            ..TriggeredEventArgs::default()
        },
    )
}

/// Add a scheduled property change to the session.
pub fn change_individual_property_scheduled(
    campaign: &mut Campaign,
    args: ChangePropertyArgs,
) -> Result<()> {
    let changer = property_value_changer(campaign, args.property)?;
    let event = scheduled_campaign_event(
        campaign,
        ScheduledEventArgs {
            start_day: args.start_day,
            node_ids: args.node_ids,
            nodeset: None,
            interventions: vec![changer],
            number_repetitions: args.number_repetitions,
            timesteps_between_repetitions: args.timesteps_between_repetitions,
            targeting: args.targeting,
        },
    )?;
    campaign.add(event)
}

/// Add a triggered property change to the session.
pub fn change_individual_property_triggered(
    campaign: &mut Campaign,
    args: ChangePropertyArgs,
) -> Result<()> {
    let changer = property_value_changer(campaign, args.property)?;
    let blackout = args.blackout.then(|| Blackout {
        event_trigger: BLACKOUT.to_string(),
        on_first_occurrence: true,
        period: 1.0,
    });
    let event = triggered_campaign_event_with_optional_delay(
        campaign,
        TriggeredEventArgs {
            start_day: args.start_day,
            node_ids: args.node_ids,
            triggers: args.triggers,
            interventions: vec![changer],
            targeting: args.targeting,
            duration: args.listening_duration,
            blackout,
            check_eligibility_at_trigger: args.check_eligibility_at_trigger,
            delay: args.delay,
            ..TriggeredEventArgs::default()
        },
    )?;
    campaign.add(event)
}

/// Triggered when triggers are given, scheduled otherwise.
pub fn change_individual_property(campaign: &mut Campaign, args: ChangePropertyArgs) -> Result<()> {
    if args.triggers.is_empty() {
        change_individual_property_scheduled(campaign, args)
    } else {
        change_individual_property_triggered(campaign, args)
    }
}

fn campaign_event(
    campaign: &Campaign,
    start_day: f64,
    event_name: Option<&str>,
    nodeset: SchemaDict,
    coordinator: SchemaDict,
) -> Result<SchemaDict> {
    let mut event = new_object(campaign, CAMPAIGN_EVENT_CLASS)?;
    event.set("Start_Day", number(start_day))?;
    if let Some(event_name) = event_name {
        event.set("Event_Name", event_name)?;
    }
    event.set_node("Nodeset_Config", nodeset)?;
    event.set_node("Event_Coordinator_Config", coordinator)?;
    Ok(event)
}

fn resolve_nodeset(
    campaign: &Campaign,
    node_ids: &[u32],
    nodeset: Option<SchemaDict>,
) -> Result<SchemaDict> {
    match nodeset {
        Some(_) if !node_ids.is_empty() => Err(ConfigError::ConflictingArguments(
            "supply node ids or a nodeset, not both".to_string(),
        )),
        Some(nodeset) => Ok(nodeset),
        None => node_set(campaign, node_ids),
    }
}

fn single_or_distributor(
    campaign: &mut Campaign,
    mut interventions: Vec<SchemaDict>,
) -> Result<SchemaDict> {
    if interventions.len() > 1 {
        return multi_intervention_distributor(campaign, interventions);
    }
    interventions.pop().ok_or_else(|| {
        ConfigError::InvalidArgument("an event needs at least one intervention".to_string())
    })
}

/// Coverage, demographic selection and property restrictions.
///
/// Ages are restricted when they differ from the schema's full-range defaults;
/// gender is restricted unless it is `All`.
fn apply_targeting(target: &mut SchemaDict, targeting: &Targeting) -> Result<()> {
    target.set("Demographic_Coverage", number(targeting.demographic_coverage))?;

    let age_restricted = [
        ("Target_Age_Min", targeting.target_age_min),
        ("Target_Age_Max", targeting.target_age_max),
    ]
    .into_iter()
    .any(|(key, age)| age.is_some_and(|age| differs_from_default(target, key, age)));
    let gender_restricted = targeting
        .target_gender
        .as_deref()
        .is_some_and(|gender| gender != ALL_GENDERS);
    let demographic = match (age_restricted, gender_restricted) {
        (_, true) => "ExplicitAgeRangesAndGender",
        (true, false) => "ExplicitAgeRanges",
        (false, false) => "Everyone",
    };
    target.set("Target_Demographic", demographic)?;

    if let Some(age) = targeting.target_age_min {
        target.set("Target_Age_Min", number(age))?;
    }
    if let Some(age) = targeting.target_age_max {
        target.set("Target_Age_Max", number(age))?;
    }
    if let Some(gender) = &targeting.target_gender {
        target.set("Target_Gender", gender.as_str())?;
    }
    target.set(
        "Target_Residents_Only",
        flag(targeting.target_residents_only),
    )?;
    normalize(&targeting.property_restrictions)?.apply(target)
}

fn differs_from_default(target: &SchemaDict, key: &str, value: f64) -> bool {
    let default = target
        .param_spec(key)
        .and_then(|spec| spec.default_value())
        .and_then(numeric_value);
    match default {
        Some(default) => default != value,
        None => true,
    }
}

#[cfg(test)]
#[path = "common_tests.rs"]
mod tests;
