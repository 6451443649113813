//! Builtin functions and the top-level environment.
//!
//! Builtins are host functions; special forms live in the translator. The
//! table below covers arithmetic, sequences, maps, atoms, printing and the
//! macro-flag operations. [`top_env`] finishes by evaluating a short
//! prelude written in the language itself, which bootstraps `defmacro!`
//! out of `set-ismacro` and defines `cond` with it.

use indexmap::IndexMap;

use crate::compile::Compiler;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::form::{Form, MapKey};
use crate::printer;
use crate::reader;

/// Definitions evaluated at startup, before the session sees any input.
const PRELUDE: &[&str] = &[
    "(def! not (fn* (a) (if a false true)))",
    r#"(def! load-file (fn* (f) (eval (read-string (str "(do " (slurp f) "\nnil)")))))"#,
    "(def! defmacro! (fn* (name function-ast) \
         (list 'do (list 'def! name (eval function-ast)) (list 'set-ismacro name))))",
    "(set-ismacro defmacro!)",
    "(defmacro! cond (fn* (& xs) \
         (if (> (count xs) 0) \
             (list 'if (first xs) \
                   (if (> (count xs) 1) (nth xs 1) (throw \"odd number of forms to cond\")) \
                   (cons 'cond (rest (rest xs)))))))",
];

/// Build the top-level environment: every builtin, `*ARGV*` (empty until a
/// script supplies arguments), then the prelude.
pub fn top_env(vm: &Compiler) -> Result<Env> {
    let env = Env::new();
    install(&env, vm);
    env.define("*ARGV*", Form::list(Vec::new()));
    for source in PRELUDE {
        let ast = reader::read_str(source)?;
        vm.eval(&ast, &env)?;
    }
    Ok(env)
}

fn install(env: &Env, vm: &Compiler) {
    type Builtin = fn(&[Form]) -> Result<Form>;
    let table: &[(&'static str, Builtin)] = &[
        ("+", add),
        ("-", sub),
        ("*", mul),
        ("/", div),
        ("%", modulo),
        ("=", equal),
        ("<", lt),
        ("<=", le),
        (">", gt),
        (">=", ge),
        ("list", list),
        ("list?", is_list),
        ("empty?", is_empty),
        ("count", count),
        ("cons", cons),
        ("concat", concat),
        ("first", first),
        ("rest", rest),
        ("nth", nth),
        ("vector", vector),
        ("vector?", is_vector),
        ("hash-map", hash_map),
        ("map?", is_map),
        ("assoc", assoc),
        ("get", get),
        ("keys", keys),
        ("vals", vals),
        ("contains?", contains),
        ("atom", atom),
        ("atom?", is_atom),
        ("deref", deref),
        ("reset!", reset),
        ("pr-str", pr_str),
        ("str", to_str),
        ("prn", prn),
        ("println", print_line),
        ("read-string", read_string),
        ("slurp", slurp),
        ("nil?", is_nil),
        ("true?", is_true),
        ("false?", is_false),
        ("number?", is_number),
        ("symbol?", is_symbol),
        ("string?", is_string),
        ("keyword?", is_keyword),
        ("fn?", is_fn),
        ("macro?", is_macro),
        ("with-meta", with_meta),
        ("meta", meta),
        ("throw", throw),
        ("set-ismacro", set_ismacro),
        ("unset-ismacro", unset_ismacro),
        ("ismacro", ismacro),
    ];
    for &(name, func) in table {
        env.define(name, Form::native(name, func));
    }

    // `swap!` and `eval` re-enter the compiler. `eval` always runs against
    // the top-level environment, not the caller's.
    let swap_vm = vm.clone();
    env.define(
        "swap!",
        Form::native("swap!", move |args| swap(&swap_vm, args)),
    );
    let eval_vm = vm.clone();
    let top = env.clone();
    env.define(
        "eval",
        Form::native("eval", move |args| {
            let [form] = exact("eval", args)?;
            eval_vm.eval(form, &top)
        }),
    );
}

// ==================== HELPERS ====================

/// Require an exact argument count, borrowing the slice as an array.
fn exact<'a, const N: usize>(name: &str, args: &'a [Form]) -> Result<&'a [Form; N]> {
    args.try_into().map_err(|_| Error::arity(name, N, args.len()))
}

fn number(form: &Form) -> Result<i64> {
    form.as_number()
        .ok_or_else(|| Error::type_mismatch("a number", form))
}

fn seq(form: &Form) -> Result<&[Form]> {
    form.as_seq()
        .ok_or_else(|| Error::type_mismatch("a sequence", form))
}

fn text(form: &Form) -> Result<&str> {
    form.as_str()
        .ok_or_else(|| Error::type_mismatch("a string", form))
}

fn entries(form: &Form) -> Result<&IndexMap<MapKey, Form>> {
    match form {
        Form::Map(entries, _) => Ok(entries),
        other => Err(Error::type_mismatch("a map", other)),
    }
}

fn numeric_pair(name: &'static str, args: &[Form]) -> Result<(i64, i64)> {
    let [a, b] = exact(name, args)?;
    Ok((number(a)?, number(b)?))
}

// ==================== ARITHMETIC ====================

fn add(args: &[Form]) -> Result<Form> {
    let mut total: i64 = 0;
    for arg in args {
        total = total.wrapping_add(number(arg)?);
    }
    Ok(Form::Number(total))
}

fn sub(args: &[Form]) -> Result<Form> {
    match args {
        [] => Ok(Form::Number(0)),
        [only] => Ok(Form::Number(number(only)?.wrapping_neg())),
        [head, tail @ ..] => {
            let mut total = number(head)?;
            for arg in tail {
                total = total.wrapping_sub(number(arg)?);
            }
            Ok(Form::Number(total))
        }
    }
}

fn mul(args: &[Form]) -> Result<Form> {
    let mut total: i64 = 1;
    for arg in args {
        total = total.wrapping_mul(number(arg)?);
    }
    Ok(Form::Number(total))
}

fn div(args: &[Form]) -> Result<Form> {
    let [head, tail @ ..] = args else {
        return Err(Error::arity_at_least("/", 1, args.len()));
    };
    let mut total = number(head)?;
    for arg in tail {
        let divisor = number(arg)?;
        if divisor == 0 {
            return Err(Error::DivisionByZero);
        }
        total = total.wrapping_div(divisor);
    }
    Ok(Form::Number(total))
}

fn modulo(args: &[Form]) -> Result<Form> {
    let (a, b) = numeric_pair("%", args)?;
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    Ok(Form::Number(a.wrapping_rem(b)))
}

// ==================== COMPARISON ====================

fn equal(args: &[Form]) -> Result<Form> {
    let [a, b] = exact("=", args)?;
    Ok(Form::Bool(a == b))
}

fn lt(args: &[Form]) -> Result<Form> {
    let (a, b) = numeric_pair("<", args)?;
    Ok(Form::Bool(a < b))
}

fn le(args: &[Form]) -> Result<Form> {
    let (a, b) = numeric_pair("<=", args)?;
    Ok(Form::Bool(a <= b))
}

fn gt(args: &[Form]) -> Result<Form> {
    let (a, b) = numeric_pair(">", args)?;
    Ok(Form::Bool(a > b))
}

fn ge(args: &[Form]) -> Result<Form> {
    let (a, b) = numeric_pair(">=", args)?;
    Ok(Form::Bool(a >= b))
}

// ==================== SEQUENCES ====================

fn list(args: &[Form]) -> Result<Form> {
    Ok(Form::list(args.to_vec()))
}

fn is_list(args: &[Form]) -> Result<Form> {
    let [form] = exact("list?", args)?;
    Ok(Form::Bool(matches!(form, Form::List(..))))
}

fn is_empty(args: &[Form]) -> Result<Form> {
    let [form] = exact("empty?", args)?;
    match form {
        Form::Nil => Ok(Form::Bool(true)),
        other => Ok(Form::Bool(seq(other)?.is_empty())),
    }
}

fn count(args: &[Form]) -> Result<Form> {
    let [form] = exact("count", args)?;
    match form {
        Form::Nil => Ok(Form::Number(0)),
        other => Ok(Form::Number(seq(other)?.len() as i64)),
    }
}

fn cons(args: &[Form]) -> Result<Form> {
    let [head, tail] = exact("cons", args)?;
    let tail = seq(tail)?;
    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(head.clone());
    items.extend_from_slice(tail);
    Ok(Form::list(items))
}

fn concat(args: &[Form]) -> Result<Form> {
    let mut items = Vec::new();
    for arg in args {
        items.extend_from_slice(seq(arg)?);
    }
    Ok(Form::list(items))
}

fn first(args: &[Form]) -> Result<Form> {
    let [form] = exact("first", args)?;
    match form {
        Form::Nil => Ok(Form::Nil),
        other => Ok(seq(other)?.first().cloned().unwrap_or(Form::Nil)),
    }
}

fn rest(args: &[Form]) -> Result<Form> {
    let [form] = exact("rest", args)?;
    match form {
        Form::Nil => Ok(Form::list(Vec::new())),
        other => {
            let items = seq(other)?;
            Ok(Form::list(items.get(1..).unwrap_or(&[]).to_vec()))
        }
    }
}

fn nth(args: &[Form]) -> Result<Form> {
    let [form, index] = exact("nth", args)?;
    let items = seq(form)?;
    let index = number(index)?;
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(Error::OutOfBounds {
            index,
            length: items.len(),
        })
}

fn vector(args: &[Form]) -> Result<Form> {
    Ok(Form::vector(args.to_vec()))
}

fn is_vector(args: &[Form]) -> Result<Form> {
    let [form] = exact("vector?", args)?;
    Ok(Form::Bool(matches!(form, Form::Vector(..))))
}

// ==================== MAPS ====================

fn hash_map(args: &[Form]) -> Result<Form> {
    if args.len() % 2 != 0 {
        return Err(Error::InvalidMapKey(
            "odd number of arguments to hash-map".into(),
        ));
    }
    let mut entries = IndexMap::new();
    for pair in args.chunks(2) {
        entries.insert(MapKey::from_form(&pair[0])?, pair[1].clone());
    }
    Ok(Form::map(entries))
}

fn is_map(args: &[Form]) -> Result<Form> {
    let [form] = exact("map?", args)?;
    Ok(Form::Bool(matches!(form, Form::Map(..))))
}

fn assoc(args: &[Form]) -> Result<Form> {
    let [base, pairs @ ..] = args else {
        return Err(Error::arity_at_least("assoc", 1, args.len()));
    };
    if pairs.len() % 2 != 0 {
        return Err(Error::InvalidMapKey(
            "odd number of key/value arguments to assoc".into(),
        ));
    }
    let mut updated = entries(base)?.clone();
    for pair in pairs.chunks(2) {
        updated.insert(MapKey::from_form(&pair[0])?, pair[1].clone());
    }
    Ok(Form::map(updated))
}

fn get(args: &[Form]) -> Result<Form> {
    let [target, key] = exact("get", args)?;
    if matches!(target, Form::Nil) {
        return Ok(Form::Nil);
    }
    let map = entries(target)?;
    let Some(key) = MapKey::for_lookup(key) else {
        return Ok(Form::Nil);
    };
    Ok(map.get(&key).cloned().unwrap_or(Form::Nil))
}

fn keys(args: &[Form]) -> Result<Form> {
    let [target] = exact("keys", args)?;
    let items = entries(target)?.keys().map(MapKey::to_form).collect();
    Ok(Form::list(items))
}

fn vals(args: &[Form]) -> Result<Form> {
    let [target] = exact("vals", args)?;
    let items = entries(target)?.values().cloned().collect();
    Ok(Form::list(items))
}

fn contains(args: &[Form]) -> Result<Form> {
    let [target, key] = exact("contains?", args)?;
    let map = entries(target)?;
    let found = MapKey::for_lookup(key).is_some_and(|key| map.contains_key(&key));
    Ok(Form::Bool(found))
}

// ==================== ATOMS ====================

fn atom(args: &[Form]) -> Result<Form> {
    let [value] = exact("atom", args)?;
    Ok(Form::atom(value.clone()))
}

fn is_atom(args: &[Form]) -> Result<Form> {
    let [form] = exact("atom?", args)?;
    Ok(Form::Bool(matches!(form, Form::Atom(_))))
}

fn deref(args: &[Form]) -> Result<Form> {
    let [form] = exact("deref", args)?;
    match form {
        Form::Atom(cell) => Ok(cell.borrow().clone()),
        other => Err(Error::type_mismatch("an atom", other)),
    }
}

fn reset(args: &[Form]) -> Result<Form> {
    let [target, value] = exact("reset!", args)?;
    match target {
        Form::Atom(cell) => {
            *cell.borrow_mut() = value.clone();
            Ok(value.clone())
        }
        other => Err(Error::type_mismatch("an atom", other)),
    }
}

fn swap(vm: &Compiler, args: &[Form]) -> Result<Form> {
    let [target, func, extra @ ..] = args else {
        return Err(Error::arity_at_least("swap!", 2, args.len()));
    };
    let Form::Atom(cell) = target else {
        return Err(Error::type_mismatch("an atom", target));
    };
    // Read, then release the borrow before re-entering the compiler.
    let current = cell.borrow().clone();
    let mut call_args = Vec::with_capacity(extra.len() + 1);
    call_args.push(current);
    call_args.extend_from_slice(extra);
    let updated = vm.apply(func, call_args)?;
    *cell.borrow_mut() = updated.clone();
    Ok(updated)
}

// ==================== PRINTING AND IO ====================

fn pr_str(args: &[Form]) -> Result<Form> {
    Ok(Form::string(printer::pr_seq(args, true, " ")))
}

fn to_str(args: &[Form]) -> Result<Form> {
    Ok(Form::string(printer::pr_seq(args, false, "")))
}

fn prn(args: &[Form]) -> Result<Form> {
    println!("{}", printer::pr_seq(args, true, " "));
    Ok(Form::Nil)
}

fn print_line(args: &[Form]) -> Result<Form> {
    println!("{}", printer::pr_seq(args, false, " "));
    Ok(Form::Nil)
}

fn read_string(args: &[Form]) -> Result<Form> {
    let [source] = exact("read-string", args)?;
    reader::read_str(text(source)?)
}

fn slurp(args: &[Form]) -> Result<Form> {
    let [path] = exact("slurp", args)?;
    let path = text(path)?;
    std::fs::read_to_string(path)
        .map(Form::string)
        .map_err(|err| Error::Eval(format!("unable to read {path}: {err}")))
}

// ==================== PREDICATES ====================

fn is_nil(args: &[Form]) -> Result<Form> {
    let [form] = exact("nil?", args)?;
    Ok(Form::Bool(matches!(form, Form::Nil)))
}

fn is_true(args: &[Form]) -> Result<Form> {
    let [form] = exact("true?", args)?;
    Ok(Form::Bool(matches!(form, Form::Bool(true))))
}

fn is_false(args: &[Form]) -> Result<Form> {
    let [form] = exact("false?", args)?;
    Ok(Form::Bool(matches!(form, Form::Bool(false))))
}

fn is_number(args: &[Form]) -> Result<Form> {
    let [form] = exact("number?", args)?;
    Ok(Form::Bool(matches!(form, Form::Number(_))))
}

fn is_symbol(args: &[Form]) -> Result<Form> {
    let [form] = exact("symbol?", args)?;
    Ok(Form::Bool(matches!(form, Form::Symbol(_))))
}

/// Symbols satisfy `string?` as well; `=` still tells them apart.
fn is_string(args: &[Form]) -> Result<Form> {
    let [form] = exact("string?", args)?;
    Ok(Form::Bool(matches!(form, Form::Str(_) | Form::Symbol(_))))
}

fn is_keyword(args: &[Form]) -> Result<Form> {
    let [form] = exact("keyword?", args)?;
    Ok(Form::Bool(matches!(form, Form::Keyword(_))))
}

fn is_fn(args: &[Form]) -> Result<Form> {
    let [form] = exact("fn?", args)?;
    let callable = match form {
        Form::Native(_) => true,
        Form::Fn(lambda) => !lambda.is_macro.get(),
        _ => false,
    };
    Ok(Form::Bool(callable))
}

fn is_macro(args: &[Form]) -> Result<Form> {
    let [form] = exact("macro?", args)?;
    Ok(Form::Bool(form.as_macro().is_some()))
}

// ==================== METADATA ====================

fn with_meta(args: &[Form]) -> Result<Form> {
    let [target, meta] = exact("with-meta", args)?;
    target.with_meta(meta)
}

fn meta(args: &[Form]) -> Result<Form> {
    let [target] = exact("meta", args)?;
    target.meta()
}

// ==================== EXCEPTIONS ====================

fn throw(args: &[Form]) -> Result<Form> {
    let [value] = exact("throw", args)?;
    Err(Error::Thrown(value.clone()))
}

// ==================== MACRO FLAG ====================

fn set_ismacro(args: &[Form]) -> Result<Form> {
    flag_macro("set-ismacro", args, true)
}

fn unset_ismacro(args: &[Form]) -> Result<Form> {
    flag_macro("unset-ismacro", args, false)
}

fn flag_macro(name: &'static str, args: &[Form], flagged: bool) -> Result<Form> {
    let [form] = exact(name, args)?;
    match form {
        Form::Fn(lambda) => {
            lambda.is_macro.set(flagged);
            Ok(Form::Nil)
        }
        other => Err(Error::type_mismatch("a user function", other)),
    }
}

fn ismacro(args: &[Form]) -> Result<Form> {
    let [form] = exact("ismacro", args)?;
    Ok(Form::Bool(form.as_macro().is_some()))
}
