//! Country name resolution for national statistics lookups.
//!
//! Geocoders return free-text country names ("United Kingdom", "Deutschland",
//! "Côte d'Ivoire"); indicator APIs want ISO 3166-1 alpha-3 codes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub name: &'static str,
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    pub aliases: &'static [&'static str],
}

const fn c(
    name: &'static str,
    alpha2: &'static str,
    alpha3: &'static str,
    aliases: &'static [&'static str],
) -> Country {
    Country {
        name,
        alpha2,
        alpha3,
        aliases,
    }
}

/// Minimum Jaro-Winkler similarity accepted by the last matching pass.
const FUZZY_THRESHOLD: f64 = 0.88;

pub static COUNTRIES: &[Country] = &[
    c("Afghanistan", "AF", "AFG", &[]),
    c("Åland Islands", "AX", "ALA", &["Aland Islands"]),
    c("Albania", "AL", "ALB", &["Shqipëria"]),
    c("Algeria", "DZ", "DZA", &[]),
    c("American Samoa", "AS", "ASM", &[]),
    c("Andorra", "AD", "AND", &[]),
    c("Angola", "AO", "AGO", &[]),
    c("Anguilla", "AI", "AIA", &[]),
    c("Antarctica", "AQ", "ATA", &[]),
    c("Antigua and Barbuda", "AG", "ATG", &[]),
    c("Argentina", "AR", "ARG", &[]),
    c("Armenia", "AM", "ARM", &[]),
    c("Aruba", "AW", "ABW", &[]),
    c("Australia", "AU", "AUS", &[]),
    c("Austria", "AT", "AUT", &["Österreich"]),
    c("Azerbaijan", "AZ", "AZE", &[]),
    c("Bahamas", "BS", "BHS", &["The Bahamas"]),
    c("Bahrain", "BH", "BHR", &[]),
    c("Bangladesh", "BD", "BGD", &[]),
    c("Barbados", "BB", "BRB", &[]),
    c("Belarus", "BY", "BLR", &[]),
    c("Belgium", "BE", "BEL", &["België", "Belgique", "Belgien"]),
    c("Belize", "BZ", "BLZ", &[]),
    c("Benin", "BJ", "BEN", &[]),
    c("Bermuda", "BM", "BMU", &[]),
    c("Bhutan", "BT", "BTN", &[]),
    c("Bolivia", "BO", "BOL", &["Plurinational State of Bolivia"]),
    c("Bonaire, Sint Eustatius and Saba", "BQ", "BES", &["Caribbean Netherlands"]),
    c("Bosnia and Herzegovina", "BA", "BIH", &[]),
    c("Botswana", "BW", "BWA", &[]),
    c("Bouvet Island", "BV", "BVT", &[]),
    c("Brazil", "BR", "BRA", &["Brasil"]),
    c("British Indian Ocean Territory", "IO", "IOT", &[]),
    c("Brunei", "BN", "BRN", &["Brunei Darussalam"]),
    c("Bulgaria", "BG", "BGR", &[]),
    c("Burkina Faso", "BF", "BFA", &[]),
    c("Burundi", "BI", "BDI", &[]),
    c("Cabo Verde", "CV", "CPV", &["Cape Verde"]),
    c("Cambodia", "KH", "KHM", &[]),
    c("Cameroon", "CM", "CMR", &[]),
    c("Canada", "CA", "CAN", &[]),
    c("Cayman Islands", "KY", "CYM", &[]),
    c("Central African Republic", "CF", "CAF", &[]),
    c("Chad", "TD", "TCD", &[]),
    c("Chile", "CL", "CHL", &[]),
    c("China", "CN", "CHN", &["People's Republic of China"]),
    c("Christmas Island", "CX", "CXR", &[]),
    c("Cocos (Keeling) Islands", "CC", "CCK", &["Cocos Islands"]),
    c("Colombia", "CO", "COL", &[]),
    c("Comoros", "KM", "COM", &[]),
    c("Congo", "CG", "COG", &["Republic of the Congo", "Congo-Brazzaville"]),
    c("Democratic Republic of the Congo", "CD", "COD", &["DR Congo", "Congo-Kinshasa"]),
    c("Cook Islands", "CK", "COK", &[]),
    c("Costa Rica", "CR", "CRI", &[]),
    c("Côte d'Ivoire", "CI", "CIV", &["Cote d'Ivoire", "Ivory Coast"]),
    c("Croatia", "HR", "HRV", &["Hrvatska"]),
    c("Cuba", "CU", "CUB", &[]),
    c("Curaçao", "CW", "CUW", &["Curacao"]),
    c("Cyprus", "CY", "CYP", &[]),
    c("Czechia", "CZ", "CZE", &["Czech Republic", "Česko"]),
    c("Denmark", "DK", "DNK", &["Danmark"]),
    c("Djibouti", "DJ", "DJI", &[]),
    c("Dominica", "DM", "DMA", &[]),
    c("Dominican Republic", "DO", "DOM", &[]),
    c("Ecuador", "EC", "ECU", &[]),
    c("Egypt", "EG", "EGY", &[]),
    c("El Salvador", "SV", "SLV", &[]),
    c("Equatorial Guinea", "GQ", "GNQ", &[]),
    c("Eritrea", "ER", "ERI", &[]),
    c("Estonia", "EE", "EST", &["Eesti"]),
    c("Eswatini", "SZ", "SWZ", &["Swaziland"]),
    c("Ethiopia", "ET", "ETH", &[]),
    c("Falkland Islands", "FK", "FLK", &["Falkland Islands (Malvinas)"]),
    c("Faroe Islands", "FO", "FRO", &[]),
    c("Fiji", "FJ", "FJI", &[]),
    c("Finland", "FI", "FIN", &["Suomi"]),
    c("France", "FR", "FRA", &[]),
    c("French Guiana", "GF", "GUF", &[]),
    c("French Polynesia", "PF", "PYF", &[]),
    c("French Southern Territories", "TF", "ATF", &[]),
    c("Gabon", "GA", "GAB", &[]),
    c("Gambia", "GM", "GMB", &["The Gambia"]),
    c("Georgia", "GE", "GEO", &[]),
    c("Germany", "DE", "DEU", &["Deutschland"]),
    c("Ghana", "GH", "GHA", &[]),
    c("Gibraltar", "GI", "GIB", &[]),
    c("Greece", "GR", "GRC", &["Hellas", "Ελλάς"]),
    c("Greenland", "GL", "GRL", &[]),
    c("Grenada", "GD", "GRD", &[]),
    c("Guadeloupe", "GP", "GLP", &[]),
    c("Guam", "GU", "GUM", &[]),
    c("Guatemala", "GT", "GTM", &[]),
    c("Guernsey", "GG", "GGY", &[]),
    c("Guinea", "GN", "GIN", &[]),
    c("Guinea-Bissau", "GW", "GNB", &[]),
    c("Guyana", "GY", "GUY", &[]),
    c("Haiti", "HT", "HTI", &[]),
    c("Heard Island and McDonald Islands", "HM", "HMD", &[]),
    c("Holy See", "VA", "VAT", &["Vatican City", "Vatican"]),
    c("Honduras", "HN", "HND", &[]),
    c("Hong Kong", "HK", "HKG", &[]),
    c("Hungary", "HU", "HUN", &["Magyarország"]),
    c("Iceland", "IS", "ISL", &["Ísland"]),
    c("India", "IN", "IND", &["Bharat"]),
    c("Indonesia", "ID", "IDN", &[]),
    c("Iran", "IR", "IRN", &["Islamic Republic of Iran"]),
    c("Iraq", "IQ", "IRQ", &[]),
    c("Ireland", "IE", "IRL", &["Éire", "Republic of Ireland"]),
    c("Isle of Man", "IM", "IMN", &[]),
    c("Israel", "IL", "ISR", &[]),
    c("Italy", "IT", "ITA", &["Italia"]),
    c("Jamaica", "JM", "JAM", &[]),
    c("Japan", "JP", "JPN", &["Nippon"]),
    c("Jersey", "JE", "JEY", &[]),
    c("Jordan", "JO", "JOR", &[]),
    c("Kazakhstan", "KZ", "KAZ", &[]),
    c("Kenya", "KE", "KEN", &[]),
    c("Kiribati", "KI", "KIR", &[]),
    c("North Korea", "KP", "PRK", &["Democratic People's Republic of Korea"]),
    c("South Korea", "KR", "KOR", &["Korea", "Republic of Korea"]),
    c("Kuwait", "KW", "KWT", &[]),
    c("Kyrgyzstan", "KG", "KGZ", &[]),
    c("Laos", "LA", "LAO", &["Lao People's Democratic Republic"]),
    c("Latvia", "LV", "LVA", &["Latvija"]),
    c("Lebanon", "LB", "LBN", &[]),
    c("Lesotho", "LS", "LSO", &[]),
    c("Liberia", "LR", "LBR", &[]),
    c("Libya", "LY", "LBY", &[]),
    c("Liechtenstein", "LI", "LIE", &[]),
    c("Lithuania", "LT", "LTU", &["Lietuva"]),
    c("Luxembourg", "LU", "LUX", &[]),
    c("Macao", "MO", "MAC", &["Macau"]),
    c("Madagascar", "MG", "MDG", &[]),
    c("Malawi", "MW", "MWI", &[]),
    c("Malaysia", "MY", "MYS", &[]),
    c("Maldives", "MV", "MDV", &[]),
    c("Mali", "ML", "MLI", &[]),
    c("Malta", "MT", "MLT", &[]),
    c("Marshall Islands", "MH", "MHL", &[]),
    c("Martinique", "MQ", "MTQ", &[]),
    c("Mauritania", "MR", "MRT", &[]),
    c("Mauritius", "MU", "MUS", &[]),
    c("Mayotte", "YT", "MYT", &[]),
    c("Mexico", "MX", "MEX", &["México"]),
    c("Micronesia", "FM", "FSM", &["Federated States of Micronesia"]),
    c("Moldova", "MD", "MDA", &["Republic of Moldova"]),
    c("Monaco", "MC", "MCO", &[]),
    c("Mongolia", "MN", "MNG", &[]),
    c("Montenegro", "ME", "MNE", &["Crna Gora"]),
    c("Montserrat", "MS", "MSR", &[]),
    c("Morocco", "MA", "MAR", &[]),
    c("Mozambique", "MZ", "MOZ", &[]),
    c("Myanmar", "MM", "MMR", &["Burma"]),
    c("Namibia", "NA", "NAM", &[]),
    c("Nauru", "NR", "NRU", &[]),
    c("Nepal", "NP", "NPL", &[]),
    c("Netherlands", "NL", "NLD", &["Nederland", "The Netherlands", "Holland"]),
    c("New Caledonia", "NC", "NCL", &[]),
    c("New Zealand", "NZ", "NZL", &["Aotearoa"]),
    c("Nicaragua", "NI", "NIC", &[]),
    c("Niger", "NE", "NER", &[]),
    c("Nigeria", "NG", "NGA", &[]),
    c("Niue", "NU", "NIU", &[]),
    c("Norfolk Island", "NF", "NFK", &[]),
    c("North Macedonia", "MK", "MKD", &["Macedonia"]),
    c("Northern Mariana Islands", "MP", "MNP", &[]),
    c("Norway", "NO", "NOR", &["Norge"]),
    c("Oman", "OM", "OMN", &[]),
    c("Pakistan", "PK", "PAK", &[]),
    c("Palau", "PW", "PLW", &[]),
    c("Palestine", "PS", "PSE", &["State of Palestine", "Palestinian Territories"]),
    c("Panama", "PA", "PAN", &["Panamá"]),
    c("Papua New Guinea", "PG", "PNG", &[]),
    c("Paraguay", "PY", "PRY", &[]),
    c("Peru", "PE", "PER", &["Perú"]),
    c("Philippines", "PH", "PHL", &["Pilipinas"]),
    c("Pitcairn", "PN", "PCN", &["Pitcairn Islands"]),
    c("Poland", "PL", "POL", &["Polska"]),
    c("Portugal", "PT", "PRT", &[]),
    c("Puerto Rico", "PR", "PRI", &[]),
    c("Qatar", "QA", "QAT", &[]),
    c("Réunion", "RE", "REU", &["Reunion"]),
    c("Romania", "RO", "ROU", &["România"]),
    c("Russia", "RU", "RUS", &["Russian Federation", "Rossiya"]),
    c("Rwanda", "RW", "RWA", &[]),
    c("Saint Barthélemy", "BL", "BLM", &["Saint Barthelemy"]),
    c("Saint Helena, Ascension and Tristan da Cunha", "SH", "SHN", &["Saint Helena"]),
    c("Saint Kitts and Nevis", "KN", "KNA", &[]),
    c("Saint Lucia", "LC", "LCA", &[]),
    c("Saint Martin", "MF", "MAF", &["Saint Martin (French part)"]),
    c("Saint Pierre and Miquelon", "PM", "SPM", &[]),
    c("Saint Vincent and the Grenadines", "VC", "VCT", &[]),
    c("Samoa", "WS", "WSM", &[]),
    c("San Marino", "SM", "SMR", &[]),
    c("Sao Tome and Principe", "ST", "STP", &["São Tomé and Príncipe"]),
    c("Saudi Arabia", "SA", "SAU", &[]),
    c("Senegal", "SN", "SEN", &[]),
    c("Serbia", "RS", "SRB", &["Srbija"]),
    c("Seychelles", "SC", "SYC", &[]),
    c("Sierra Leone", "SL", "SLE", &[]),
    c("Singapore", "SG", "SGP", &[]),
    c("Sint Maarten", "SX", "SXM", &["Sint Maarten (Dutch part)"]),
    c("Slovakia", "SK", "SVK", &["Slovensko"]),
    c("Slovenia", "SI", "SVN", &["Slovenija"]),
    c("Solomon Islands", "SB", "SLB", &[]),
    c("Somalia", "SO", "SOM", &[]),
    c("South Africa", "ZA", "ZAF", &[]),
    c("South Georgia and the South Sandwich Islands", "GS", "SGS", &[]),
    c("South Sudan", "SS", "SSD", &[]),
    c("Spain", "ES", "ESP", &["España"]),
    c("Sri Lanka", "LK", "LKA", &[]),
    c("Sudan", "SD", "SDN", &[]),
    c("Suriname", "SR", "SUR", &[]),
    c("Svalbard and Jan Mayen", "SJ", "SJM", &[]),
    c("Sweden", "SE", "SWE", &["Sverige"]),
    c("Switzerland", "CH", "CHE", &["Schweiz", "Suisse", "Svizzera"]),
    c("Syria", "SY", "SYR", &["Syrian Arab Republic"]),
    c("Taiwan", "TW", "TWN", &["Taiwan, Province of China"]),
    c("Tajikistan", "TJ", "TJK", &[]),
    c("Tanzania", "TZ", "TZA", &["United Republic of Tanzania"]),
    c("Thailand", "TH", "THA", &[]),
    c("Timor-Leste", "TL", "TLS", &["East Timor"]),
    c("Togo", "TG", "TGO", &[]),
    c("Tokelau", "TK", "TKL", &[]),
    c("Tonga", "TO", "TON", &[]),
    c("Trinidad and Tobago", "TT", "TTO", &[]),
    c("Tunisia", "TN", "TUN", &[]),
    c("Türkiye", "TR", "TUR", &["Turkey", "Turkiye"]),
    c("Turkmenistan", "TM", "TKM", &[]),
    c("Turks and Caicos Islands", "TC", "TCA", &[]),
    c("Tuvalu", "TV", "TUV", &[]),
    c("Uganda", "UG", "UGA", &[]),
    c("Ukraine", "UA", "UKR", &["Ukraina"]),
    c("United Arab Emirates", "AE", "ARE", &["UAE"]),
    c(
        "United Kingdom",
        "GB",
        "GBR",
        &["UK", "Great Britain", "Britain", "United Kingdom of Great Britain and Northern Ireland"],
    ),
    c("United States", "US", "USA", &["United States of America", "America"]),
    c("United States Minor Outlying Islands", "UM", "UMI", &[]),
    c("Uruguay", "UY", "URY", &[]),
    c("Uzbekistan", "UZ", "UZB", &[]),
    c("Vanuatu", "VU", "VUT", &[]),
    c("Venezuela", "VE", "VEN", &["Bolivarian Republic of Venezuela"]),
    c("Vietnam", "VN", "VNM", &["Viet Nam"]),
    c("British Virgin Islands", "VG", "VGB", &["Virgin Islands, British"]),
    c("United States Virgin Islands", "VI", "VIR", &["Virgin Islands, U.S."]),
    c("Wallis and Futuna", "WF", "WLF", &[]),
    c("Western Sahara", "EH", "ESH", &[]),
    c("Yemen", "YE", "YEM", &[]),
    c("Zambia", "ZM", "ZMB", &[]),
    c("Zimbabwe", "ZW", "ZWE", &[]),
];

fn fold_char(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'š' => 's',
        'ž' => 'z',
        other => other,
    }
}

/// Lower-cases, folds common accents and collapses punctuation to single spaces.
fn simplify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(fold_char)
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Country {
    fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// Country whose shortest simplified name satisfies `matches`.
fn shortest_containing(matches: impl Fn(&str) -> bool) -> Option<&'static Country> {
    COUNTRIES
        .iter()
        .filter_map(|country| {
            country
                .names()
                .map(simplify)
                .filter(|name| matches(name))
                .map(|name| name.len())
                .min()
                .map(|len| (len, country))
        })
        .min_by_key(|(len, _)| *len)
        .map(|(_, country)| country)
}

/// Resolves a free-text country name to a [`Country`].
///
/// Tries, in order: exact name/alias/code match, the shortest name containing
/// the query as whole words, the shortest name containing it anywhere, then
/// the closest name by Jaro-Winkler similarity.
pub fn search_fuzzy(query: &str) -> Option<&'static Country> {
    let needle = simplify(query);
    if needle.is_empty() {
        return None;
    }

    let exact = COUNTRIES.iter().find(|country| {
        country.alpha2.eq_ignore_ascii_case(&needle)
            || country.alpha3.eq_ignore_ascii_case(&needle)
            || country.names().any(|name| simplify(name) == needle)
    });
    if exact.is_some() {
        return exact;
    }

    let padded = format!(" {} ", needle);
    let contained = shortest_containing(|name| format!(" {} ", name).contains(&padded))
        .or_else(|| shortest_containing(|name| name.contains(&needle)));
    if contained.is_some() {
        return contained;
    }

    COUNTRIES
        .iter()
        .filter_map(|country| {
            country
                .names()
                .map(|name| strsim::jaro_winkler(&simplify(name), &needle))
                .fold(None, |best: Option<f64>, score| {
                    Some(best.map_or(score, |b| b.max(score)))
                })
                .map(|score| (score, country))
        })
        .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, country)| country)
}
