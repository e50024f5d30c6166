//! Built-in reference data for the tracks and car models the server knows.
//!
//! The first track in [`TRACKS`] is the server's default circuit.

use racce_types::CarClass;

/// `(label, name, country)` for every supported circuit.
pub const TRACKS: &[(&str, &str, &str)] = &[
    ("monza", "Autodromo Nazionale di Monza", "Italy"),
    ("zolder", "Circuit Zolder", "Belgium"),
    ("brands_hatch", "Brands Hatch Circuit", "Great Britain"),
    ("silverstone", "Silverstone", "Great Britain"),
    ("paul_ricard", "Circuit Paul Ricard", "France"),
    ("misano", "Misano World Circuit", "Italy"),
    ("spa", "Circuit de Spa-Francorchamps", "Belgium"),
    ("nurburgring", "Nürburgring", "Germany"),
    ("barcelona", "Circuit de Barcelona-Catalunya", "Spain"),
    ("hungaroring", "Hungaroring", "Hungary"),
    ("zandvoort", "Circuit Zandvoort", "Netherlands"),
    ("kyalami", "Kyalami Grand Prix Circuit", "South Africa"),
    ("mount_panorama", "Mount Panorama Circuit", "Australia"),
    ("suzuka", "Suzuka Circuit", "Japan"),
    ("laguna_seca", "WeatherTech Raceway Laguna Seca", "USA"),
    ("imola", "Autodromo Enzo e Dino Ferrari", "Italy"),
    ("oulton_park", "Oulton Park", "Great Britain"),
    ("donington", "Donington Park", "Great Britain"),
    ("snetterton", "Snetterton Circuit", "Great Britain"),
    ("cota", "Circuit of the Americas", "USA"),
    ("indianapolis", "Indianapolis Motor Speedway", "USA"),
    ("watkins_glen", "Watkins Glen International", "USA"),
    ("valencia", "Circuit Ricardo Tormo", "Spain"),
    ("red_bull_ring", "Red Bull Ring", "Austria"),
    ("nurburgring_24h", "Nürburgring 24h", "Germany"),
];

/// `(id, name, class)` for every supported car model.
pub const CAR_MODELS: &[(u32, &str, CarClass)] = &[
    (0, "Porsche 991 GT3 R", CarClass::Gt3),
    (1, "Mercedes-AMG GT3", CarClass::Gt3),
    (2, "Ferrari 488 GT3", CarClass::Gt3),
    (3, "Audi R8 LMS", CarClass::Gt3),
    (4, "Lamborghini Huracán GT3", CarClass::Gt3),
    (5, "McLaren 650S GT3", CarClass::Gt3),
    (6, "Nissan GT-R Nismo GT3 2018", CarClass::Gt3),
    (7, "BMW M6 GT3", CarClass::Gt3),
    (8, "Bentley Continental GT3 2018", CarClass::Gt3),
    (9, "Porsche 991 II GT3 Cup", CarClass::Cup),
    (10, "Nissan GT-R Nismo GT3 2017", CarClass::Gt3),
    (11, "Bentley Continental GT3 2016", CarClass::Gt3),
    (12, "Aston Martin V12 Vantage GT3", CarClass::Gt3),
    (13, "Lamborghini Gallardo R-EX", CarClass::Gt3),
    (14, "Jaguar G3", CarClass::Gt3),
    (15, "Lexus RC F GT3", CarClass::Gt3),
    (16, "Lamborghini Huracán GT3 Evo", CarClass::Gt3),
    (17, "Honda NSX GT3", CarClass::Gt3),
    (18, "Lamborghini Huracán Super Trofeo", CarClass::St),
    (19, "Audi R8 LMS Evo", CarClass::Gt3),
    (20, "Aston Martin V8 Vantage GT3", CarClass::Gt3),
    (21, "Honda NSX GT3 Evo", CarClass::Gt3),
    (22, "McLaren 720S GT3", CarClass::Gt3),
    (23, "Porsche 991 II GT3 R", CarClass::Gt3),
    (24, "Ferrari 488 GT3 Evo", CarClass::Gt3),
    (25, "Mercedes-AMG GT3 2020", CarClass::Gt3),
    (26, "Ferrari 488 Challenge Evo", CarClass::Chl),
    (27, "BMW M2 CS Racing", CarClass::Tcx),
    (28, "Porsche 992 GT3 Cup", CarClass::Cup),
    (29, "Lamborghini Huracán Super Trofeo Evo2", CarClass::St),
    (30, "BMW M4 GT3", CarClass::Gt3),
    (31, "Audi R8 LMS GT3 Evo II", CarClass::Gt3),
    (32, "Ferrari 296 GT3", CarClass::Gt3),
    (33, "Lamborghini Huracán GT3 Evo2", CarClass::Gt3),
    (34, "Porsche 992 GT3 R", CarClass::Gt3),
    (35, "McLaren 720S GT3 Evo", CarClass::Gt3),
    (36, "Ford Mustang GT3", CarClass::Gt3),
    (50, "Alpine A110 GT4", CarClass::Gt4),
    (51, "Aston Martin Vantage GT4", CarClass::Gt4),
    (52, "Audi R8 LMS GT4", CarClass::Gt4),
    (53, "BMW M4 GT4", CarClass::Gt4),
    (55, "Chevrolet Camaro GT4", CarClass::Gt4),
    (56, "Ginetta G55 GT4", CarClass::Gt4),
    (57, "KTM X-Bow GT4", CarClass::Gt4),
    (58, "Maserati MC GT4", CarClass::Gt4),
    (59, "McLaren 570S GT4", CarClass::Gt4),
    (60, "Mercedes-AMG GT4", CarClass::Gt4),
    (61, "Porsche 718 Cayman GT4", CarClass::Gt4),
    (80, "Audi R8 LMS GT2", CarClass::Gt2),
    (82, "KTM X-Bow GT2", CarClass::Gt2),
    (83, "Maserati MC20 GT2", CarClass::Gt2),
    (84, "Mercedes-AMG GT2", CarClass::Gt2),
    (85, "Porsche 911 GT2 RS CS Evo", CarClass::Gt2),
    (86, "Porsche 935", CarClass::Gt2),
];
