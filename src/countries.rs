use anyhow::{bail, Result};

/// Countries the directory can be browsed by, in menu order: (display name, code).
pub const COUNTRIES: &[(&str, &str)] = &[
    ("United States", "US"),
    ("Japan", "JP"),
    ("Italy", "IT"),
    ("Korea", "KR"),
    ("France", "FR"),
    ("Germany", "DE"),
    ("Taiwan", "TW"),
    ("Russian Federation", "RU"),
    ("United Kingdom", "GB"),
    ("Netherlands", "NL"),
    ("Czech Republic", "CZ"),
    ("Turkey", "TR"),
    ("Austria", "AT"),
    ("Switzerland", "CH"),
    ("Spain", "ES"),
    ("Canada", "CA"),
    ("Sweden", "SE"),
    ("Israel", "IL"),
    ("Poland", "PL"),
    ("Iran", "IR"),
    ("Norway", "NO"),
    ("Romania", "RO"),
    ("India", "IN"),
    ("Viet Nam", "VN"),
    ("Belgium", "BE"),
    ("Brazil", "BR"),
    ("Bulgaria", "BG"),
    ("Indonesia", "ID"),
    ("Denmark", "DK"),
    ("Argentina", "AR"),
    ("Mexico", "MX"),
    ("Finland", "FI"),
    ("China", "CN"),
    ("Chile", "CL"),
    ("South Africa", "ZA"),
    ("Slovakia", "SK"),
    ("Hungary", "HU"),
    ("Ireland", "IE"),
    ("Egypt", "EG"),
    ("Thailand", "TH"),
    ("Ukraine", "UA"),
    ("Serbia", "RS"),
    ("Hong Kong", "HK"),
    ("Greece", "GR"),
    ("Portugal", "PT"),
    ("Latvia", "LV"),
    ("Singapore", "SG"),
    ("Iceland", "IS"),
    ("Malaysia", "MY"),
    ("Colombia", "CO"),
    ("Tunisia", "TN"),
    ("Estonia", "EE"),
    ("Dominican Republic", "DO"),
    ("Slovenia", "SI"),
    ("Ecuador", "EC"),
    ("Lithuania", "LT"),
    ("Palestinian", "PS"),
    ("New Zealand", "NZ"),
    ("Bangladesh", "BD"),
    ("Panama", "PA"),
    ("Moldova", "MD"),
    ("Nicaragua", "NI"),
    ("Malta", "MT"),
    ("Trinidad And Tobago", "TT"),
    ("Saudi Arabia", "SA"),
    ("Croatia", "HR"),
    ("Cyprus", "CY"),
    ("Pakistan", "PK"),
    ("United Arab Emirates", "AE"),
    ("Kazakhstan", "KZ"),
    ("Kuwait", "KW"),
    ("Venezuela", "VE"),
    ("Georgia", "GE"),
    ("Montenegro", "ME"),
    ("El Salvador", "SV"),
    ("Luxembourg", "LU"),
    ("Curacao", "CW"),
    ("Puerto Rico", "PR"),
    ("Costa Rica", "CR"),
    ("Belarus", "BY"),
    ("Albania", "AL"),
    ("Liechtenstein", "LI"),
    ("Bosnia And Herzegovina", "BA"),
    ("Paraguay", "PY"),
    ("Philippines", "PH"),
    ("Faroe Islands", "FO"),
    ("Guatemala", "GT"),
    ("Nepal", "NP"),
    ("Peru", "PE"),
    ("Uruguay", "UY"),
    ("Extra", "-"),
    ("Andorra", "AD"),
    ("Antigua And Barbuda", "AG"),
    ("Armenia", "AM"),
    ("Angola", "AO"),
    ("Australia", "AU"),
    ("Aruba", "AW"),
    ("Azerbaijan", "AZ"),
    ("Barbados", "BB"),
    ("Bonaire", "BQ"),
    ("Bahamas", "BS"),
    ("Botswana", "BW"),
    ("Congo", "CG"),
    ("Ivory Coast", "CI"),
    ("Algeria", "DZ"),
    ("Fiji", "FJ"),
    ("Gabon", "GA"),
    ("Guernsey", "GG"),
    ("Greenland", "GL"),
    ("Guadeloupe", "GP"),
    ("Guam", "GU"),
    ("Guyana", "GY"),
    ("Honduras", "HN"),
    ("Jersey", "JE"),
    ("Jamaica", "JM"),
    ("Jordan", "JO"),
    ("Kenya", "KE"),
    ("Cambodia", "KH"),
    ("Saint Kitts", "KN"),
    ("Cayman Islands", "KY"),
    ("Laos", "LA"),
    ("Lebanon", "LB"),
    ("Sri Lanka", "LK"),
    ("Morocco", "MA"),
    ("Madagascar", "MG"),
    ("Macedonia", "MK"),
    ("Mongolia", "MN"),
    ("Macao", "MO"),
    ("Martinique", "MQ"),
    ("Mauritius", "MU"),
    ("Namibia", "NA"),
    ("New Caledonia", "NC"),
    ("Nigeria", "NG"),
    ("Qatar", "QA"),
    ("Reunion", "RE"),
    ("Sudan", "SD"),
    ("Senegal", "SN"),
    ("Suriname", "SR"),
    ("Sao Tome And Principe", "ST"),
    ("Syria", "SY"),
    ("Tanzania", "TZ"),
    ("Uganda", "UG"),
    ("Uzbekistan", "UZ"),
    ("Saint Vincent And The Grenadines", "VC"),
    ("Benin", "BJ"),
];

/// Case-insensitive lookup by country code. Returns the canonical (name, code) entry.
pub fn find_by_code(code: &str) -> Option<(&'static str, &'static str)> {
    let code = code.trim();
    COUNTRIES
        .iter()
        .copied()
        .find(|(_, c)| c.eq_ignore_ascii_case(code))
}

/// Validate a 1-based menu choice against a list of `len` entries and return its index.
pub fn parse_choice(input: &str, len: usize) -> Result<usize> {
    let n: usize = match input.trim().parse() {
        Ok(n) => n,
        Err(_) => bail!("Invalid input. Please enter a number."),
    };
    if n < 1 || n > len {
        bail!("Please enter a number between 1 and {len}.");
    }
    Ok(n - 1)
}

/// Plain numbered listing, one country per line.
pub fn menu_lines() -> Vec<String> {
    COUNTRIES
        .iter()
        .enumerate()
        .map(|(i, (name, code))| format!("{:3}) {name} ({code})", i + 1))
        .collect()
}
