/// Number of fields in an [EventRecord]
pub const NFIELDS: usize = 10;

/// Column names of the per-run and merged event tables, in storage order
pub const FIELD_NAMES: [&str; NFIELDS] = [
    "eventNum",
    "dijetMass",
    "leadingJetPt",
    "subleadingJetPt",
    "deltaPhi",
    "deltaEta",
    "x1",
    "x2",
    "parton1Id",
    "parton2Id",
];

/// Human-readable column names used for text export
pub const EXPORT_HEADER: [&str; NFIELDS] = [
    "Event",
    "Mass",
    "LeadPt",
    "SubleadPt",
    "DeltaPhi",
    "DeltaEta",
    "x1",
    "x2",
    "Parton1",
    "Parton2",
];

/// One selected dijet event
///
/// All quantities are stored in single precision, including the event
/// number and the parton ids.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EventRecord {
    /// Event number within the run
    pub event: f32,
    /// Dijet invariant mass
    pub dijet_mass: f32,
    /// Transverse momentum of the leading jet
    pub leading_jet_pt: f32,
    /// Transverse momentum of the subleading jet
    pub subleading_jet_pt: f32,
    /// Azimuthal angle difference between the jets
    pub delta_phi: f32,
    /// Pseudorapidity difference between the jets
    pub delta_eta: f32,
    /// Momentum fraction of the first incoming parton
    pub x1: f32,
    /// Momentum fraction of the second incoming parton
    pub x2: f32,
    /// PDG id of the first incoming parton
    pub parton1_id: f32,
    /// PDG id of the second incoming parton
    pub parton2_id: f32,
}

impl From<[f32; NFIELDS]> for EventRecord {
    fn from(v: [f32; NFIELDS]) -> Self {
        let [
            event,
            dijet_mass,
            leading_jet_pt,
            subleading_jet_pt,
            delta_phi,
            delta_eta,
            x1,
            x2,
            parton1_id,
            parton2_id,
        ] = v;
        Self {
            event,
            dijet_mass,
            leading_jet_pt,
            subleading_jet_pt,
            delta_phi,
            delta_eta,
            x1,
            x2,
            parton1_id,
            parton2_id,
        }
    }
}

impl From<EventRecord> for [f32; NFIELDS] {
    fn from(e: EventRecord) -> Self {
        [
            e.event,
            e.dijet_mass,
            e.leading_jet_pt,
            e.subleading_jet_pt,
            e.delta_phi,
            e.delta_eta,
            e.x1,
            e.x2,
            e.parton1_id,
            e.parton2_id,
        ]
    }
}
