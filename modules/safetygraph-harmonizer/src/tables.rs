//! Built-in concordance data.
//!
//! Hazard rows: (source code, unified code, domain, label fr, label en).
//! Secondary rows: (source code, unified code, label fr, label en).
//! Cross-walk rows: (source code, target code, isic code, label).

use safetygraph_common::UnifiedDomain::{self, *};

type HazardRow = (&'static str, &'static str, UnifiedDomain, &'static str, &'static str);
type CodeRow = (&'static str, &'static str, &'static str, &'static str);
type CrosswalkRow = (&'static str, &'static str, &'static str, &'static str);

/// OSHA event/exposure codes (OIICS).
pub const OSHA_EVENT: &[HazardRow] = &[
    ("42", "CHUTE-01", Falls, "Chute de hauteur", "Fall from height"),
    ("421", "CHUTE-01", Falls, "Chute de hauteur", "Fall from height"),
    ("422", "CHUTE-03", Falls, "Chute dans escaliers", "Fall on stairs"),
    ("43", "CHUTE-02", Falls, "Chute de plain-pied", "Fall on same level"),
    ("51", "ELEC-01", Electrical, "Contact électrique", "Electrical contact"),
    ("511", "ELEC-01", Electrical, "Contact électrique direct", "Direct electrical contact"),
    ("512", "ELEC-02", Electrical, "Arc électrique", "Arc flash"),
    ("21", "MACH-01", Machinery, "Frappé par objet", "Struck by object"),
    ("22", "MACH-02", Machinery, "Heurté contre objet", "Struck against object"),
    ("23", "MACH-03", Machinery, "Coincement", "Caught in machinery"),
    ("232", "MACH-04", Machinery, "Écrasement", "Crushing"),
    ("71", "ERGO-01", Ergonomics, "Effort excessif", "Overexertion"),
    ("72", "ERGO-02", Ergonomics, "Mouvement répétitif", "Repetitive motion"),
    ("731", "ERGO-03", Ergonomics, "Posture contraignante", "Awkward posture"),
    ("32", "FEU-01", FireExplosion, "Incendie", "Fire"),
    ("321", "FEU-02", FireExplosion, "Explosion", "Explosion"),
    ("53", "CHIM-01", Chemical, "Exposition chimique", "Chemical exposure"),
    ("534", "CHIM-02", Chemical, "Inhalation toxique", "Toxic inhalation"),
    ("31", "THERM-01", Thermal, "Contact chaud", "Contact with hot object"),
    ("55", "THERM-02", Thermal, "Stress thermique", "Heat stress"),
    ("26", "VEH-01", Vehicle, "Accident véhicule", "Vehicle accident"),
    ("542", "CONF-01", ConfinedSpace, "Asphyxie espace clos", "Confined space asphyxiation"),
    ("12", "RPS-01", Psychosocial, "Violence au travail", "Workplace violence"),
];

/// Eurostat ESAW deviation codes.
pub const ESAW_DEVIATION: &[HazardRow] = &[
    ("51", "CHUTE-01", Falls, "Chute de hauteur", "Fall from height"),
    ("52", "CHUTE-02", Falls, "Chute de plain-pied", "Fall on same level"),
    ("61", "ELEC-01", Electrical, "Contact électrique direct", "Direct electrical contact"),
    ("62", "ELEC-02", Electrical, "Arc électrique", "Arc flash"),
    ("43", "MACH-01", Machinery, "Heurt par objet", "Struck by object"),
    ("44", "MACH-02", Machinery, "Heurt contre objet", "Struck against object"),
    ("41", "MACH-03", Machinery, "Happement machine", "Caught in machinery"),
    ("42", "MACH-04", Machinery, "Écrasement", "Crushing"),
    ("71", "ERGO-01", Ergonomics, "Effort excessif", "Overexertion"),
    ("72", "ERGO-02", Ergonomics, "Mouvement répétitif", "Repetitive motion"),
    ("73", "ERGO-03", Ergonomics, "Posture contraignante", "Awkward posture"),
    ("21", "FEU-01", FireExplosion, "Incendie", "Fire"),
    ("22", "FEU-02", FireExplosion, "Explosion", "Explosion"),
    ("15", "CHIM-01", Chemical, "Exposition substance", "Substance exposure"),
    ("63", "THERM-01", Thermal, "Contact chaud/froid", "Contact with hot/cold"),
    ("81", "THERM-02", Thermal, "Stress thermique", "Thermal stress"),
    ("11", "VEH-01", Vehicle, "Accident véhicule", "Vehicle accident"),
    ("82", "RPS-01", Psychosocial, "Violence", "Violence"),
];

/// CNESST genre d'accident codes.
pub const CNESST_GENRE: &[HazardRow] = &[
    ("31", "CHUTE-01", Falls, "Chute niveau inférieur", "Fall to lower level"),
    ("32", "CHUTE-02", Falls, "Chute même niveau", "Fall on same level"),
    ("51", "ELEC-01", Electrical, "Contact électricité", "Electrical contact"),
    ("52", "ELEC-02", Electrical, "Arc électrique", "Arc flash"),
    ("21", "MACH-01", Machinery, "Frappé par objet", "Struck by object"),
    ("22", "MACH-02", Machinery, "Heurt contre objet", "Struck against object"),
    ("23", "MACH-03", Machinery, "Happement", "Caught in"),
    ("24", "MACH-04", Machinery, "Écrasement", "Crushing"),
    ("11", "ERGO-01", Ergonomics, "Effort en soulevant", "Overexertion lifting"),
    ("12", "ERGO-02", Ergonomics, "Mouvement répétitif", "Repetitive motion"),
    ("13", "ERGO-03", Ergonomics, "Posture contraignante", "Awkward posture"),
    ("61", "FEU-01", FireExplosion, "Incendie", "Fire"),
    ("62", "FEU-02", FireExplosion, "Explosion", "Explosion"),
    ("41", "CHIM-01", Chemical, "Exposition nocive", "Harmful exposure"),
    ("42", "CHIM-02", Chemical, "Inhalation", "Inhalation"),
    ("53", "THERM-01", Thermal, "Contact chaud", "Contact with hot"),
    ("44", "THERM-02", Thermal, "Chaleur/froid", "Heat/cold"),
    ("71", "VEH-01", Vehicle, "Accident véhicule", "Vehicle accident"),
    ("43", "CONF-01", ConfinedSpace, "Asphyxie", "Asphyxiation"),
    ("91", "RPS-01", Psychosocial, "Violence/agression", "Violence/aggression"),
];

/// OSHA nature-of-injury codes.
pub const OSHA_NATURE: &[CodeRow] = &[
    ("121", "NAT-01", "Fracture", "Fracture"),
    ("122", "NAT-05", "Amputation", "Amputation"),
    ("211", "NAT-02", "Entorse/Foulure", "Sprain/Strain"),
    ("212", "NAT-10", "TMS", "MSD"),
    ("131", "NAT-03", "Contusion", "Contusion"),
    ("111", "NAT-04", "Coupure", "Cut/Laceration"),
    ("321", "NAT-06", "Brûlure thermique", "Thermal burn"),
    ("322", "NAT-07", "Brûlure chimique", "Chemical burn"),
    ("323", "NAT-08", "Brûlure électrique", "Electrical burn"),
    ("331", "NAT-09", "Électrocution", "Electrocution"),
    ("341", "NAT-11", "Intoxication", "Poisoning"),
    ("342", "NAT-12", "Asphyxie", "Asphyxiation"),
    ("561", "NAT-13", "Stress post-traumatique", "PTSD"),
    ("999", "NAT-99", "Décès", "Fatality"),
];

/// OSHA part-of-body codes.
pub const OSHA_BODY_PART: &[CodeRow] = &[
    ("1", "BP-01", "Tête", "Head"),
    ("12", "BP-02", "Œil", "Eye"),
    ("2", "BP-03", "Cou", "Neck"),
    ("32", "BP-04", "Dos", "Back"),
    ("41", "BP-05", "Épaule", "Shoulder"),
    ("42", "BP-06", "Bras", "Arm"),
    ("44", "BP-07", "Main", "Hand"),
    ("45", "BP-08", "Doigt", "Finger"),
    ("31", "BP-09", "Poitrine", "Chest"),
    ("33", "BP-10", "Abdomen", "Abdomen"),
    ("51", "BP-11", "Bassin/Hanche", "Pelvis/Hip"),
    ("52", "BP-12", "Jambe", "Leg"),
    ("53", "BP-13", "Genou", "Knee"),
    ("54", "BP-14", "Pied", "Foot"),
    ("55", "BP-15", "Orteil", "Toe"),
    ("8", "BP-90", "Corps entier", "Whole body"),
];

/// NAICS / SCIAN -> (NACE, ISIC).
pub const SCIAN_CROSSWALK: &[CrosswalkRow] = &[
    ("23", "F", "F", "Construction"),
    ("236", "F41", "41", "Construction de bâtiments"),
    ("238", "F43", "43", "Travaux spécialisés"),
    ("23821", "F4321", "4321", "Travaux d'électricité"),
    ("2211", "D351", "351", "Production d'électricité"),
    ("221122", "D3513", "3513", "Distribution d'électricité"),
    ("31-33", "C", "C", "Fabrication"),
    ("31", "C", "C", "Fabrication"),
    ("32", "C", "C", "Fabrication"),
    ("33", "C", "C", "Fabrication"),
    ("332", "C25", "25", "Fabrication métallique"),
    ("21", "B", "B", "Mines"),
    ("11", "A01", "01", "Agriculture"),
    ("484", "H49", "49", "Transport routier"),
    ("62", "Q86", "86", "Santé"),
];

/// NACE Rev. 2 -> (NAICS / SCIAN, ISIC).
pub const NACE_CROSSWALK: &[CrosswalkRow] = &[
    ("F", "23", "F", "Construction"),
    ("F41", "236", "41", "Construction de bâtiments"),
    ("F43", "238", "43", "Travaux spécialisés"),
    ("F4321", "23821", "4321", "Travaux d'électricité"),
    ("D351", "2211", "351", "Production d'électricité"),
    ("D3513", "221122", "3513", "Distribution d'électricité"),
    ("C", "31-33", "C", "Fabrication"),
    ("C25", "332", "25", "Fabrication métallique"),
    ("B", "21", "B", "Mines"),
    ("A01", "11", "01", "Agriculture"),
    ("H49", "484", "49", "Transport routier"),
    ("Q86", "62", "86", "Santé"),
];
