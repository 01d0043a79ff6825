/*
 * Arithmetic for the calculator tool: a small recursive-descent evaluator over
 * `f64` and the display formatting of results.
 *
 * Grammar, loosest binding first:
 *   expression = term (("+" | "-") term)*
 *   term       = unary (("*" | "/") unary)*
 *   unary      = ("-" | "+") unary | power
 *   power      = postfix ("^" unary)?
 *   postfix    = primary ("%" | "²")*
 *   primary    = number | "(" expression ")" | "√" postfix | name | name "(" expression ")"
 *
 * `×`, `÷` and `−` are accepted for `*`, `/` and `-`. Numbers may carry `,`
 * thousands separators and an exponent, so a displayed result can be typed
 * back in.
 */

#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    Empty,
    UnexpectedChar(char),
    InvalidNumber(String),
    UnexpectedToken(String),
    UnexpectedEnd,
    UnknownName(String),
    DivisionByZero,
    Domain(String),
    Overflow,
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcError::Empty => write!(f, "Empty expression"),
            CalcError::UnexpectedChar(c) => write!(f, "Unexpected character '{c}'"),
            CalcError::InvalidNumber(text) => write!(f, "Invalid number '{text}'"),
            CalcError::UnexpectedToken(token) => write!(f, "Unexpected '{token}'"),
            CalcError::UnexpectedEnd => write!(f, "Expression ends too early"),
            CalcError::UnknownName(name) => write!(f, "Unknown function or constant '{name}'"),
            CalcError::DivisionByZero => write!(f, "Division by zero"),
            CalcError::Domain(msg) => write!(f, "{msg}"),
            CalcError::Overflow => write!(f, "Result is too large"),
        }
    }
}

impl std::error::Error for CalcError {}

pub type Result<T> = std::result::Result<T, CalcError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Squared,
    Root,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Name(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Caret => "^".into(),
            Token::Percent => "%".into(),
            Token::Squared => "²".into(),
            Token::Root => "√".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && matches!(chars[i], '0'..='9' | '.' | ',') {
                i += 1;
            }
            // Exponent only when digits follow; a bare `e` is the constant.
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .replace(',', "")
                .parse::<f64>()
                .map_err(|_| CalcError::InvalidNumber(text.clone()))?;
            tokens.push(Token::Number(value));
            continue;
        }
        if c.is_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_alphanumeric() {
                i += 1;
            }
            tokens.push(Token::Name(
                chars[start..i].iter().collect::<String>().to_lowercase(),
            ));
            continue;
        }
        let token = match c {
            '+' => Token::Plus,
            '-' | '−' => Token::Minus,
            '*' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '^' => Token::Caret,
            '%' => Token::Percent,
            '²' => Token::Squared,
            '√' => Token::Root,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(CalcError::UnexpectedChar(other)),
        };
        tokens.push(token);
        i += 1;
    }
    Ok(tokens)
}

fn square_root(value: f64) -> Result<f64> {
    if value < 0.0 {
        return Err(CalcError::Domain(
            "Square root of a negative number".to_string(),
        ));
    }
    Ok(value.sqrt())
}

fn apply_function(name: &str, arg: f64) -> Result<f64> {
    match name {
        "sqrt" => square_root(arg),
        "sqr" => Ok(arg * arg),
        "neg" => Ok(-arg),
        "abs" => Ok(arg.abs()),
        "recip" => {
            if arg == 0.0 {
                Err(CalcError::DivisionByZero)
            } else {
                Ok(1.0 / arg)
            }
        }
        other => Err(CalcError::UnknownName(other.to_string())),
    }
}

fn constant(name: &str) -> Result<f64> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        other => Err(CalcError::UnknownName(other.to_string())),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_close(&mut self) -> Result<()> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            Some(other) => Err(CalcError::UnexpectedToken(other.describe())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            if self.eat(&Token::Plus) {
                value += self.term()?;
            } else if self.eat(&Token::Minus) {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                value *= self.unary()?;
            } else if self.eat(&Token::Slash) {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64> {
        if self.eat(&Token::Minus) {
            return Ok(-self.unary()?);
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.postfix()?;
        if self.eat(&Token::Caret) {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<f64> {
        let mut value = self.primary()?;
        loop {
            if self.eat(&Token::Percent) {
                value /= 100.0;
            } else if self.eat(&Token::Squared) {
                value *= value;
            } else {
                return Ok(value);
            }
        }
    }

    fn primary(&mut self) -> Result<f64> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expression()?;
                self.expect_close()?;
                Ok(value)
            }
            Some(Token::Root) => square_root(self.postfix()?),
            Some(Token::Name(name)) => {
                if self.eat(&Token::LParen) {
                    let arg = self.expression()?;
                    self.expect_close()?;
                    apply_function(&name, arg)
                } else {
                    constant(&name)
                }
            }
            Some(other) => Err(CalcError::UnexpectedToken(other.describe())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/*
 * Evaluates `input`. Infinite or NaN results are reported as errors, never
 * returned.
 */
pub fn evaluate(input: &str) -> Result<f64> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression()?;
    if let Some(extra) = parser.peek() {
        return Err(CalcError::UnexpectedToken(extra.describe()));
    }
    if value.is_nan() {
        return Err(CalcError::Domain("Result is not a number".to_string()));
    }
    if value.is_infinite() {
        return Err(CalcError::Overflow);
    }
    Ok(value)
}

/* `1.234568e+17` style: six decimals, signed exponent of at least two digits. */
fn scientific(value: f64) -> String {
    let formatted = format!("{value:.6e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}

/*
 * Plain result text. Whole numbers print without a fraction up to 1e16,
 * tiny magnitudes (below 1e-6) and huge whole numbers switch to scientific
 * notation, everything else keeps at most ten decimals without trailing zeros.
 */
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        if value.abs() > 1e16 {
            return scientific(value);
        }
        return format!("{}", value as i64);
    }
    if value.abs() < 1e-6 {
        return scientific(value);
    }
    let fixed = format!("{value:.10}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/* Adds `,` thousands separators to the integer part of a formatted number. */
pub fn group_thousands(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (integer, rest) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };
    if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
        return text.to_string();
    }
    let digits = integer.as_bytes();
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(char::from(*digit));
    }
    format!("{sign}{grouped}{rest}")
}
