//! Statement interpreter for generated analysis snippets.
//!
//! The binding table is fixed: `df` (the session dataset, read-only),
//! `plt` (the plotting surface), and snippet-local variables. The accepted
//! surface is the pandas/matplotlib-shaped subset the analyst role asks
//! the model to emit; anything outside it fails the turn with a plain
//! message instead of killing the session.

use std::collections::HashMap;

use polars::prelude::DataFrame;

use super::figure::{Figure, PlotCmd};
use crate::dataset::Dataset;

const DEFAULT_HIST_BINS: usize = 10;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Num(f64),
    Str(String),
    List(Vec<Value>),
    /// A dataset column, referenced by name.
    Column(String),
    Frame(DataFrame),
    DatasetRef,
    PltRef,
    Unit,
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Num(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Column(_) => "column",
            Value::Frame(_) => "dataframe",
            Value::DatasetRef => "dataframe",
            Value::PltRef => "plotting surface",
            Value::Unit => "none",
        }
    }
}

type EvalResult = Result<Value, String>;

pub struct Interp<'a> {
    dataset: &'a Dataset,
    figure: &'a mut Figure,
    vars: &'a mut HashMap<String, Value>,
    stdout: &'a mut String,
}

impl<'a> Interp<'a> {
    pub fn new(
        dataset: &'a Dataset,
        figure: &'a mut Figure,
        vars: &'a mut HashMap<String, Value>,
        stdout: &'a mut String,
    ) -> Self {
        Self { dataset, figure, vars, stdout }
    }

    /// Execute one statement. Returns the value of a bare expression,
    /// `None` for statements with no value (assignment, raise is an Err).
    pub fn exec_stmt(&mut self, line: &str) -> Result<Option<Value>, String> {
        let tokens = lex(line)?;
        if tokens.is_empty() {
            return Ok(None);
        }

        if let Token::Ident(word) = &tokens[0] {
            if word == "raise" {
                return Err(raise_message(&tokens));
            }
            if matches!(
                word.as_str(),
                "for" | "while" | "if" | "def" | "class" | "with" | "try" | "return"
            ) {
                return Err(format!("unsupported statement: '{}'", word));
            }
        }

        // Assignment: Ident '=' expr (but not '==')
        if tokens.len() >= 3 {
            if let (Token::Ident(name), Token::Sym('=')) = (&tokens[0], &tokens[1]) {
                if !matches!(tokens.get(2), Some(Token::Sym('='))) {
                    if name == "df" || name == "plt" {
                        return Err(format!("cannot rebind '{}'", name));
                    }
                    let mut p = Parser::new(&tokens[2..]);
                    let value = self.eval_expr(&mut p)?;
                    p.expect_end()?;
                    self.vars.insert(name.clone(), value);
                    return Ok(None);
                }
            }
        }

        let mut p = Parser::new(&tokens);
        let value = self.eval_expr(&mut p)?;
        p.expect_end()?;
        Ok(Some(value))
    }

    fn eval_expr(&mut self, p: &mut Parser) -> EvalResult {
        let mut lhs = self.eval_muldiv(p)?;
        loop {
            if p.eat_sym('+') {
                let rhs = self.eval_muldiv(p)?;
                lhs = arith(lhs, rhs, '+')?;
            } else if p.eat_sym('-') {
                let rhs = self.eval_muldiv(p)?;
                lhs = arith(lhs, rhs, '-')?;
            } else {
                return Ok(lhs);
            }
        }
    }

    fn eval_muldiv(&mut self, p: &mut Parser) -> EvalResult {
        let mut lhs = self.eval_unary(p)?;
        loop {
            if p.eat_sym('*') {
                let rhs = self.eval_unary(p)?;
                lhs = arith(lhs, rhs, '*')?;
            } else if p.eat_sym('/') {
                let rhs = self.eval_unary(p)?;
                lhs = arith(lhs, rhs, '/')?;
            } else {
                return Ok(lhs);
            }
        }
    }

    fn eval_unary(&mut self, p: &mut Parser) -> EvalResult {
        if p.eat_sym('-') {
            return match self.eval_unary(p)? {
                Value::Int(v) => Ok(Value::Int(-v)),
                Value::Num(v) => Ok(Value::Num(-v)),
                other => Err(format!("cannot negate {}", other.type_name())),
            };
        }
        self.eval_postfix(p)
    }

    fn eval_postfix(&mut self, p: &mut Parser) -> EvalResult {
        let mut value = self.eval_primary(p)?;
        loop {
            if p.eat_sym('[') {
                let index = self.eval_expr(p)?;
                p.expect_sym(']')?;
                value = self.index(value, index)?;
            } else if p.eat_sym('.') {
                let name = p.expect_ident()?;
                if p.eat_sym('(') {
                    let (args, kwargs) = self.eval_args(p)?;
                    value = self.call_method(value, &name, args, kwargs)?;
                } else {
                    value = self.attr(value, &name)?;
                }
            } else {
                return Ok(value);
            }
        }
    }

    fn eval_primary(&mut self, p: &mut Parser) -> EvalResult {
        match p.next() {
            Some(Token::Int(v)) => Ok(Value::Int(*v)),
            Some(Token::Num(v)) => Ok(Value::Num(*v)),
            Some(Token::Str(s)) => Ok(Value::Str(s.clone())),
            Some(Token::Sym('(')) => {
                let value = self.eval_expr(p)?;
                p.expect_sym(')')?;
                Ok(value)
            }
            Some(Token::Sym('[')) => {
                let mut items = Vec::new();
                if !p.eat_sym(']') {
                    loop {
                        items.push(self.eval_expr(p)?);
                        if p.eat_sym(']') {
                            break;
                        }
                        p.expect_sym(',')?;
                    }
                }
                Ok(Value::List(items))
            }
            Some(Token::Ident(name)) => {
                let name = name.clone();
                if p.eat_sym('(') {
                    let (args, kwargs) = self.eval_args(p)?;
                    return self.call_builtin(&name, args, kwargs);
                }
                match name.as_str() {
                    "df" => Ok(Value::DatasetRef),
                    "plt" => Ok(Value::PltRef),
                    _ => self
                        .vars
                        .get(&name)
                        .cloned()
                        .ok_or_else(|| format!("name '{}' is not defined", name)),
                }
            }
            Some(tok) => Err(format!("unexpected token {:?}", tok)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    /// Call arguments: positional expressions plus `name=value` keywords.
    fn eval_args(
        &mut self,
        p: &mut Parser,
    ) -> Result<(Vec<Value>, HashMap<String, Value>), String> {
        let mut args = Vec::new();
        let mut kwargs = HashMap::new();
        if p.eat_sym(')') {
            return Ok((args, kwargs));
        }
        loop {
            if let (Some(Token::Ident(key)), Some(Token::Sym('='))) = (p.peek(), p.peek2()) {
                if !matches!(p.peek3(), Some(Token::Sym('='))) {
                    let key = key.clone();
                    p.next();
                    p.next();
                    let value = self.eval_expr(p)?;
                    kwargs.insert(key, value);
                    if p.eat_sym(')') {
                        break;
                    }
                    p.expect_sym(',')?;
                    continue;
                }
            }
            args.push(self.eval_expr(p)?);
            if p.eat_sym(')') {
                break;
            }
            p.expect_sym(',')?;
        }
        Ok((args, kwargs))
    }

    fn call_builtin(
        &mut self,
        name: &str,
        args: Vec<Value>,
        _kwargs: HashMap<String, Value>,
    ) -> EvalResult {
        match name {
            "print" => {
                let parts: Vec<String> = args.iter().map(|v| self.format_value(v)).collect();
                self.stdout.push_str(&parts.join(" "));
                self.stdout.push('\n');
                Ok(Value::Unit)
            }
            "len" => {
                let arg = args.into_iter().next().ok_or("len() expects one argument")?;
                let n = match arg {
                    Value::DatasetRef => self.dataset.height(),
                    Value::Frame(df) => df.height(),
                    Value::Column(name) => self.dataset.column(&name).map_err(err_str)?.len(),
                    Value::List(items) => items.len(),
                    Value::Str(s) => s.chars().count(),
                    other => return Err(format!("len() unsupported for {}", other.type_name())),
                };
                Ok(Value::Int(n as i64))
            }
            "abs" => match args.into_iter().next() {
                Some(Value::Int(v)) => Ok(Value::Int(v.abs())),
                Some(Value::Num(v)) => Ok(Value::Num(v.abs())),
                _ => Err("abs() expects a number".to_string()),
            },
            "round" => {
                let mut it = args.into_iter();
                let v = to_f64(it.next().ok_or("round() expects a number")?)?;
                let digits = match it.next() {
                    Some(d) => to_usize(d, "round() digits")?,
                    None => 0,
                };
                let factor = 10f64.powi(digits as i32);
                let rounded = (v * factor).round() / factor;
                if digits == 0 {
                    Ok(Value::Int(rounded as i64))
                } else {
                    Ok(Value::Num(rounded))
                }
            }
            "str" => {
                let arg = args.into_iter().next().ok_or("str() expects one argument")?;
                let s = self.format_value(&arg);
                Ok(Value::Str(s))
            }
            "float" => Ok(Value::Num(to_f64(
                args.into_iter().next().ok_or("float() expects one argument")?,
            )?)),
            "int" => Ok(Value::Int(
                to_f64(args.into_iter().next().ok_or("int() expects one argument")?)? as i64,
            )),
            _ => Err(format!("name '{}' is not defined", name)),
        }
    }

    fn index(&mut self, base: Value, index: Value) -> EvalResult {
        match (base, index) {
            (Value::DatasetRef, Value::Str(name)) => {
                // Validate eagerly so typos fail at the subscript, not later.
                self.dataset.column(&name).map_err(err_str)?;
                Ok(Value::Column(name))
            }
            (Value::List(items), Value::Int(i)) => {
                let idx = if i < 0 { items.len() as i64 + i } else { i };
                items
                    .get(idx as usize)
                    .cloned()
                    .ok_or_else(|| format!("list index {} out of range", i))
            }
            (base, index) => Err(format!(
                "cannot index {} with {}",
                base.type_name(),
                index.type_name()
            )),
        }
    }

    fn attr(&mut self, recv: Value, name: &str) -> EvalResult {
        match (&recv, name) {
            (Value::DatasetRef, "shape") => Ok(Value::Str(format!(
                "({}, {})",
                self.dataset.height(),
                self.dataset.width()
            ))),
            (Value::DatasetRef, "columns") => Ok(Value::List(
                self.dataset.columns().into_iter().map(Value::Str).collect(),
            )),
            (Value::Frame(df), "shape") => {
                Ok(Value::Str(format!("({}, {})", df.height(), df.width())))
            }
            (Value::Frame(df), "columns") => Ok(Value::List(
                df.get_column_names()
                    .iter()
                    .map(|s| Value::Str(s.to_string()))
                    .collect(),
            )),
            _ => Err(format!(
                "{} has no attribute '{}'",
                recv.type_name(),
                name
            )),
        }
    }

    fn call_method(
        &mut self,
        recv: Value,
        name: &str,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
    ) -> EvalResult {
        match recv {
            Value::DatasetRef => match name {
                "head" => Ok(Value::Frame(self.dataset.head(opt_usize(&args, 5)?))),
                "tail" => Ok(Value::Frame(self.dataset.tail(opt_usize(&args, 5)?))),
                "describe" => Ok(Value::Frame(self.dataset.describe().map_err(err_str)?)),
                _ => Err(format!("dataframe has no method '{}'", name)),
            },
            Value::Frame(df) => match name {
                "head" => Ok(Value::Frame(df.head(Some(opt_usize(&args, 5)?)))),
                "tail" => Ok(Value::Frame(df.tail(Some(opt_usize(&args, 5)?)))),
                _ => Err(format!("dataframe has no method '{}'", name)),
            },
            Value::Column(col) => {
                let ds = self.dataset;
                match name {
                    "mean" => Ok(Value::Num(ds.mean(&col).map_err(err_str)?)),
                    "sum" => Ok(Value::Num(ds.sum(&col).map_err(err_str)?)),
                    "min" => Ok(Value::Num(ds.min(&col).map_err(err_str)?)),
                    "max" => Ok(Value::Num(ds.max(&col).map_err(err_str)?)),
                    "std" => Ok(Value::Num(ds.std(&col).map_err(err_str)?)),
                    "median" => Ok(Value::Num(ds.median(&col).map_err(err_str)?)),
                    "count" => Ok(Value::Int(ds.count(&col).map_err(err_str)? as i64)),
                    "nunique" => Ok(Value::Int(ds.n_unique(&col).map_err(err_str)? as i64)),
                    _ => Err(format!("column has no method '{}'", name)),
                }
            }
            Value::PltRef => self.call_plot(name, args, kwargs),
            other => Err(format!("{} has no method '{}'", other.type_name(), name)),
        }
    }

    fn call_plot(
        &mut self,
        name: &str,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
    ) -> EvalResult {
        match name {
            "hist" => {
                let mut it = args.into_iter();
                let values =
                    self.to_numbers(it.next().ok_or("plt.hist() expects values")?)?;
                let bins = match kwargs.get("bins").cloned().or_else(|| it.next()) {
                    Some(v) => to_usize(v, "bins")?,
                    None => DEFAULT_HIST_BINS,
                };
                self.figure.push(PlotCmd::Hist { values, bins });
                Ok(Value::Unit)
            }
            "bar" => {
                let mut it = args.into_iter();
                let labels =
                    self.to_labels(it.next().ok_or("plt.bar() expects x values")?)?;
                let values =
                    self.to_numbers(it.next().ok_or("plt.bar() expects heights")?)?;
                self.figure.push(PlotCmd::Bar { labels, values });
                Ok(Value::Unit)
            }
            "plot" | "line" => {
                let mut it = args.into_iter();
                let first = self.to_numbers(it.next().ok_or("plt.plot() expects values")?)?;
                let (xs, ys) = match it.next() {
                    Some(second) => (first, self.to_numbers(second)?),
                    None => ((0..first.len()).map(|i| i as f64).collect(), first),
                };
                self.figure.push(PlotCmd::Line { xs, ys });
                Ok(Value::Unit)
            }
            "scatter" => {
                let mut it = args.into_iter();
                let xs = self.to_numbers(it.next().ok_or("plt.scatter() expects x values")?)?;
                let ys = self.to_numbers(it.next().ok_or("plt.scatter() expects y values")?)?;
                self.figure.push(PlotCmd::Scatter { xs, ys });
                Ok(Value::Unit)
            }
            "title" => {
                let text = self.first_str(args, "plt.title()")?;
                self.figure.set_title(text);
                Ok(Value::Unit)
            }
            "xlabel" => {
                let text = self.first_str(args, "plt.xlabel()")?;
                self.figure.set_xlabel(text);
                Ok(Value::Unit)
            }
            "ylabel" => {
                let text = self.first_str(args, "plt.ylabel()")?;
                self.figure.set_ylabel(text);
                Ok(Value::Unit)
            }
            // Accepted no-ops; figure serialization belongs to the classifier.
            "show" | "savefig" | "figure" | "tight_layout" | "grid" | "legend" | "clf"
            | "close" => Ok(Value::Unit),
            _ => Err(format!("unsupported plot call: plt.{}()", name)),
        }
    }

    fn first_str(&self, args: Vec<Value>, ctx: &str) -> Result<String, String> {
        match args.into_iter().next() {
            Some(Value::Str(s)) => Ok(s),
            Some(other) => Ok(self.format_value(&other)),
            None => Err(format!("{} expects a string", ctx)),
        }
    }

    fn to_numbers(&self, v: Value) -> Result<Vec<f64>, String> {
        match v {
            Value::Column(name) => self.dataset.numeric_values(&name).map_err(err_str),
            Value::List(items) => items.into_iter().map(to_f64).collect(),
            other => Err(format!(
                "expected a column or list of numbers, got {}",
                other.type_name()
            )),
        }
    }

    fn to_labels(&self, v: Value) -> Result<Vec<String>, String> {
        match v {
            Value::Column(name) => self.dataset.label_values(&name).map_err(err_str),
            Value::List(items) => Ok(items.iter().map(|v| self.format_value(v)).collect()),
            other => Err(format!(
                "expected a column or list of labels, got {}",
                other.type_name()
            )),
        }
    }

    pub fn format_value(&self, v: &Value) -> String {
        match v {
            Value::Int(n) => n.to_string(),
            Value::Num(n) => fmt_float(*n),
            Value::Str(s) => s.clone(),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| self.format_value(v)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Column(name) => self
                .dataset
                .column(name)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            Value::Frame(df) => df.to_string(),
            Value::DatasetRef => self.dataset.frame().to_string(),
            Value::PltRef => "<plotting surface>".to_string(),
            Value::Unit => String::new(),
        }
    }
}

/// Floats print with at least one decimal, the way the reference output
/// reads (`20.0`, not `20`).
fn fmt_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn err_str(e: anyhow::Error) -> String {
    e.to_string()
}

fn to_f64(v: Value) -> Result<f64, String> {
    match v {
        Value::Int(n) => Ok(n as f64),
        Value::Num(n) => Ok(n),
        other => Err(format!("expected a number, got {}", other.type_name())),
    }
}

fn to_usize(v: Value, ctx: &str) -> Result<usize, String> {
    let f = to_f64(v).map_err(|e| format!("{}: {}", ctx, e))?;
    if f < 0.0 || f.fract() != 0.0 {
        return Err(format!("{}: expected a non-negative integer", ctx));
    }
    Ok(f as usize)
}

fn opt_usize(args: &[Value], default: usize) -> Result<usize, String> {
    match args.first() {
        Some(v) => to_usize(v.clone(), "argument"),
        None => Ok(default),
    }
}

fn arith(lhs: Value, rhs: Value, op: char) -> EvalResult {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        // True division promotes, like the language the snippets imitate.
        if op != '/' {
            let v = match op {
                '+' => a.checked_add(*b),
                '-' => a.checked_sub(*b),
                '*' => a.checked_mul(*b),
                _ => unreachable!(),
            };
            return v.map(Value::Int).ok_or_else(|| "integer overflow".to_string());
        }
    }
    let a = to_f64(lhs)?;
    let b = to_f64(rhs)?;
    let v = match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        '/' => {
            if b == 0.0 {
                return Err("division by zero".to_string());
            }
            a / b
        }
        _ => unreachable!(),
    };
    Ok(Value::Num(v))
}

fn raise_message(tokens: &[Token]) -> String {
    for tok in tokens {
        if let Token::Str(s) = tok {
            return s.clone();
        }
    }
    let words: Vec<String> = tokens[1..]
        .iter()
        .filter_map(|t| match t {
            Token::Ident(w) => Some(w.clone()),
            _ => None,
        })
        .collect();
    if words.is_empty() {
        "exception raised".to_string()
    } else {
        words.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Lexer / token cursor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Num(f64),
    Str(String),
    Sym(char),
}

fn lex(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '#' {
            break; // trailing comment
        } else if c == '"' || c == '\'' {
            let quote = c;
            let mut s = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    Some('\\') => {
                        if let Some(&esc) = chars.get(i + 1) {
                            s.push(match esc {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                            i += 2;
                        } else {
                            return Err("dangling escape in string literal".to_string());
                        }
                    }
                    Some(&ch) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some(&ch) => {
                        s.push(ch);
                        i += 1;
                    }
                    None => return Err("unterminated string literal".to_string()),
                }
            }
            tokens.push(Token::Str(s));
        } else if c.is_ascii_digit() {
            let start = i;
            let mut is_float = false;
            while i < chars.len()
                && (chars[i].is_ascii_digit() || (chars[i] == '.' && !is_float))
            {
                if chars[i] == '.' {
                    is_float = true;
                }
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            if is_float {
                let v = text.parse::<f64>().map_err(|_| format!("bad number '{}'", text))?;
                tokens.push(Token::Num(v));
            } else {
                let v = text.parse::<i64>().map_err(|_| format!("bad number '{}'", text))?;
                tokens.push(Token::Int(v));
            }
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if "()[],.=+-*/".contains(c) {
            tokens.push(Token::Sym(c));
            i += 1;
        } else {
            return Err(format!("unexpected character '{}'", c));
        }
    }

    Ok(tokens)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn peek3(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 2)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat_sym(&mut self, sym: char) -> bool {
        if matches!(self.peek(), Some(Token::Sym(c)) if *c == sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_sym(&mut self, sym: char) -> Result<(), String> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(format!("expected '{}'", sym))
        }
    }

    fn expect_ident(&mut self) -> Result<String, String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name.clone()),
            _ => Err("expected an identifier".to_string()),
        }
    }

    fn expect_end(&self) -> Result<(), String> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(format!("unexpected trailing input at token {}", self.pos + 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use polars::prelude::NamedFrom;

    fn dataset() -> Dataset {
        let frame = df!(
            "amount" => &[10i64, 20, 30],
            "city" => &["a", "b", "a"]
        )
        .unwrap();
        Dataset::from_frame(frame, "test.csv")
    }

    fn run(ds: &Dataset, fig: &mut Figure, lines: &[&str]) -> (String, Option<Value>) {
        let mut vars = HashMap::new();
        let mut stdout = String::new();
        let mut last = None;
        for line in lines {
            let mut interp = Interp::new(ds, fig, &mut vars, &mut stdout);
            last = interp.exec_stmt(line).unwrap();
        }
        (stdout, last)
    }

    #[test]
    fn print_of_column_mean_is_python_shaped() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let (out, _) = run(&ds, &mut fig, &["print(df[\"amount\"].mean())"]);
        assert_eq!(out, "20.0\n");
    }

    #[test]
    fn print_of_string_literal() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let (out, _) = run(&ds, &mut fig, &["print('hello world')"]);
        assert_eq!(out, "hello world\n");
    }

    #[test]
    fn variables_and_arithmetic() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let (out, _) = run(
            &ds,
            &mut fig,
            &["total = df[\"amount\"].sum()", "print(total / 3)"],
        );
        assert_eq!(out, "20.0\n");
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let (out, _) = run(&ds, &mut fig, &["print(2 + 3 * 4)"]);
        assert_eq!(out, "14\n");
    }

    #[test]
    fn describe_returns_a_frame() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let (_, last) = run(&ds, &mut fig, &["df.describe()"]);
        assert!(matches!(last, Some(Value::Frame(_))));
    }

    #[test]
    fn hist_call_draws_on_figure() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        run(&ds, &mut fig, &["plt.hist(df[\"amount\"])"]);
        assert!(fig.has_content());
    }

    #[test]
    fn hist_accepts_bins_keyword() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        run(&ds, &mut fig, &["plt.hist(df[\"amount\"], bins=5)"]);
        assert!(fig.has_content());
    }

    #[test]
    fn show_and_savefig_are_noops() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        run(&ds, &mut fig, &["plt.show()", "plt.savefig('out.png')"]);
        assert!(!fig.has_content());
    }

    #[test]
    fn raise_surfaces_inner_message() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let mut vars = HashMap::new();
        let mut stdout = String::new();
        let mut interp = Interp::new(&ds, &mut fig, &mut vars, &mut stdout);
        let err = interp.exec_stmt("raise ValueError(\"bad\")").unwrap_err();
        assert_eq!(err, "bad");
    }

    #[test]
    fn unknown_column_fails_at_subscript() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let mut vars = HashMap::new();
        let mut stdout = String::new();
        let mut interp = Interp::new(&ds, &mut fig, &mut vars, &mut stdout);
        let err = interp.exec_stmt("df[\"missing\"].mean()").unwrap_err();
        assert!(err.contains("missing"));
    }

    #[test]
    fn rebinding_df_is_rejected() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let mut vars = HashMap::new();
        let mut stdout = String::new();
        let mut interp = Interp::new(&ds, &mut fig, &mut vars, &mut stdout);
        assert!(interp.exec_stmt("df = 1").is_err());
    }

    #[test]
    fn loops_are_unsupported() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let mut vars = HashMap::new();
        let mut stdout = String::new();
        let mut interp = Interp::new(&ds, &mut fig, &mut vars, &mut stdout);
        let err = interp.exec_stmt("for x in df: print(x)").unwrap_err();
        assert!(err.contains("unsupported statement"));
    }

    #[test]
    fn len_and_shape() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let (out, _) = run(&ds, &mut fig, &["print(len(df))", "print(df.shape)"]);
        assert_eq!(out, "3\n(3, 2)\n");
    }

    #[test]
    fn nunique_counts_distinct() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let (out, _) = run(&ds, &mut fig, &["print(df[\"city\"].nunique())"]);
        assert_eq!(out, "2\n");
    }
}
