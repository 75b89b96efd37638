//! The standard library: ~200 built-in functions grouped into namespaces.
//! Functions are registered by qualified name (`"filter"` at the root,
//! `"strings.camelize"` in a module) with their declared parameter names so
//! the engine can install them as introspectable function values.

pub mod arrays;
pub mod binaries;
pub(crate) mod common;
pub mod core;
pub mod crypto;
pub mod datetime;
pub mod jsonpath;
pub mod math;
pub mod numbers;
pub mod objects;
pub mod period;
pub mod regex;
pub mod strings;
pub mod url;
pub mod xml;

use crate::error::Result;
use crate::value::Value;
use std::collections::HashMap;

/// Standard library function signature. Arguments arrive already forced.
pub type BuiltinFn = fn(&[Value]) -> Result<Value>;

/// A registered builtin: its declared positional parameter names plus the
/// implementation. Parameter names feed `Func` arity introspection.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub params: &'static [&'static str],
    pub func: BuiltinFn,
}

/// Registry of all built-in functions, keyed by qualified name.
pub struct StandardLibrary {
    functions: HashMap<String, Builtin>,
}

impl Default for StandardLibrary {
    fn default() -> Self {
        StandardLibrary::new()
    }
}

impl StandardLibrary {
    /// Create a new standard library with every namespace registered.
    pub fn new() -> Self {
        let mut stdlib = StandardLibrary {
            functions: HashMap::new(),
        };
        stdlib.register_core_functions();
        stdlib.register_strings_functions();
        stdlib.register_arrays_functions();
        stdlib.register_objects_functions();
        stdlib.register_numbers_functions();
        stdlib.register_math_functions();
        stdlib.register_datetime_functions();
        stdlib.register_period_functions();
        stdlib.register_binaries_functions();
        stdlib.register_crypto_functions();
        stdlib.register_url_functions();
        stdlib.register_jsonpath_functions();
        stdlib.register_regex_functions();
        stdlib.register_xml_functions();
        stdlib
    }

    pub fn register(&mut self, name: impl Into<String>, params: &'static [&'static str], func: BuiltinFn) {
        self.functions.insert(name.into(), Builtin { params, func });
    }

    pub fn get_function(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(name)
    }

    /// All registered names in deterministic sorted order.
    pub fn function_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Builtin)> {
        self.functions.iter()
    }

    fn register_core_functions(&mut self) {
        self.register("append", &["array", "value"], core::append);
        self.register("combine", &["first", "second"], core::combine);
        self.register("contains", &["container", "value"], core::contains);
        self.register("distinctBy", &["container", "function"], core::distinct_by);
        self.register("endsWith", &["main", "sub"], core::ends_with);
        self.register("entriesOf", &["object"], core::entries_of);
        self.register("filter", &["array", "function"], core::filter);
        self.register("filterObject", &["object", "function"], core::filter_object);
        self.register("find", &["container", "value"], core::find);
        self.register("flatMap", &["array", "function"], core::flat_map);
        self.register("flatten", &["array"], core::flatten);
        self.register("foldLeft", &["array", "initValue", "function"], core::fold_left);
        self.register("foldRight", &["array", "initValue", "function"], core::fold_right);
        self.register("groupBy", &["container", "function"], core::group_by);
        self.register("isArray", &["value"], core::is_array);
        self.register("isBlank", &["value"], core::is_blank);
        self.register("isBoolean", &["value"], core::is_boolean);
        self.register("isDecimal", &["value"], core::is_decimal);
        self.register("isEmpty", &["value"], core::is_empty);
        self.register("isEven", &["value"], core::is_even);
        self.register("isFunction", &["value"], core::is_function);
        self.register("isInteger", &["value"], core::is_integer);
        self.register("isNumber", &["value"], core::is_number);
        self.register("isObject", &["value"], core::is_object);
        self.register("isOdd", &["value"], core::is_odd);
        self.register("isString", &["value"], core::is_string);
        self.register("joinBy", &["array", "separator"], core::join_by);
        self.register("keysOf", &["object"], core::keys_of);
        self.register("lower", &["string"], core::lower);
        self.register("map", &["array", "function"], core::map);
        self.register("mapEntries", &["object", "function"], core::map_entries);
        self.register("mapObject", &["object", "function"], core::map_object);
        self.register("match", &["string", "regex"], core::match_);
        self.register("matches", &["string", "regex"], core::matches);
        self.register("max", &["array"], core::max);
        self.register("maxBy", &["array", "function"], core::max_by);
        self.register("min", &["array"], core::min);
        self.register("minBy", &["array", "function"], core::min_by);
        self.register("mod", &["num1", "num2"], core::modulo);
        self.register("orderBy", &["container", "function"], core::order_by);
        self.register("parseDouble", &["string"], core::parse_double);
        self.register("parseHex", &["string"], core::parse_hex);
        self.register("parseInt", &["string"], core::parse_int);
        self.register("parseOctal", &["string"], core::parse_octal);
        self.register("prepend", &["array", "value"], core::prepend);
        self.register("range", &["start", "end"], core::range);
        self.register("remove", &["container", "value"], core::remove);
        self.register("removeAll", &["container", "values"], core::remove_all);
        self.register("replace", &["string", "searchValue", "newValue"], core::replace);
        self.register("reverse", &["container"], core::reverse);
        self.register("scan", &["string", "regex"], core::scan);
        self.register("select", &["object", "path"], core::select);
        self.register("sizeOf", &["value"], core::size_of);
        self.register("splitBy", &["string", "separator"], core::split_by);
        self.register("startsWith", &["main", "sub"], core::starts_with);
        self.register("toString", &["value"], core::to_string);
        self.register("trim", &["string"], core::trim);
        self.register("typeOf", &["value"], core::type_of);
        self.register("unzip", &["array"], core::unzip);
        self.register("upper", &["string"], core::upper);
        self.register("uuid", &[], core::uuid);
        self.register("valuesOf", &["object"], core::values_of);
        self.register("zip", &["array1", "array2"], core::zip);
    }

    fn register_strings_functions(&mut self) {
        self.register("strings.appendIfMissing", &["string", "suffix"], strings::append_if_missing);
        self.register("strings.camelize", &["string"], strings::camelize);
        self.register("strings.capitalize", &["string"], strings::capitalize);
        self.register("strings.charCode", &["string"], strings::char_code);
        self.register("strings.charCodeAt", &["string", "index"], strings::char_code_at);
        self.register("strings.dasherize", &["string"], strings::dasherize);
        self.register("strings.fromCharCode", &["charCode"], strings::from_char_code);
        self.register("strings.isAlpha", &["value"], strings::is_alpha);
        self.register("strings.isAlphanumeric", &["value"], strings::is_alphanumeric);
        self.register("strings.isLowerCase", &["value"], strings::is_lower_case);
        self.register("strings.isNumeric", &["value"], strings::is_numeric);
        self.register("strings.isUpperCase", &["value"], strings::is_upper_case);
        self.register("strings.isWhitespace", &["value"], strings::is_whitespace);
        self.register("strings.leftPad", &["value", "offset"], strings::left_pad);
        self.register("strings.ordinalize", &["num"], strings::ordinalize);
        self.register("strings.pluralize", &["value"], strings::pluralize);
        self.register("strings.prependIfMissing", &["string", "prefix"], strings::prepend_if_missing);
        self.register("strings.repeat", &["string", "times"], strings::repeat);
        self.register("strings.rightPad", &["value", "offset"], strings::right_pad);
        self.register("strings.singularize", &["value"], strings::singularize);
        self.register("strings.substringAfter", &["string", "separator"], strings::substring_after);
        self.register("strings.substringAfterLast", &["string", "separator"], strings::substring_after_last);
        self.register("strings.substringBefore", &["string", "separator"], strings::substring_before);
        self.register("strings.substringBeforeLast", &["string", "separator"], strings::substring_before_last);
        self.register("strings.underscore", &["string"], strings::underscore);
        self.register("strings.unwrap", &["value", "wrapper"], strings::unwrap);
        self.register("strings.withMaxSize", &["value", "size"], strings::with_max_size);
        self.register("strings.wrapIfMissing", &["value", "wrapper"], strings::wrap_if_missing);
        self.register("strings.wrapWith", &["value", "wrapper"], strings::wrap_with);
    }

    fn register_arrays_functions(&mut self) {
        self.register("arrays.countBy", &["array", "function"], arrays::count_by);
        self.register("arrays.deepFlatten", &["array"], arrays::deep_flatten);
        self.register("arrays.divideBy", &["array", "size"], arrays::divide_by);
        self.register("arrays.drop", &["array", "index"], arrays::drop);
        self.register("arrays.dropWhile", &["array", "function"], arrays::drop_while);
        self.register("arrays.duplicates", &["array"], arrays::duplicates);
        self.register("arrays.every", &["array", "function"], arrays::every);
        self.register("arrays.firstWith", &["array", "function"], arrays::first_with);
        self.register("arrays.indexOf", &["container", "value"], arrays::index_of);
        self.register("arrays.indexWhere", &["array", "function"], arrays::index_where);
        self.register("arrays.join", &["arrL", "arrR", "functL", "functR"], arrays::join);
        self.register("arrays.lastIndexOf", &["container", "value"], arrays::last_index_of);
        self.register("arrays.leftJoin", &["arrL", "arrR", "functL", "functR"], arrays::left_join);
        self.register("arrays.occurrences", &["array", "function"], arrays::occurrences);
        self.register("arrays.outerJoin", &["arrL", "arrR", "functL", "functR"], arrays::outer_join);
        self.register("arrays.partition", &["array", "function"], arrays::partition);
        self.register("arrays.slice", &["array", "start", "end"], arrays::slice);
        self.register("arrays.some", &["array", "function"], arrays::some);
        self.register("arrays.splitAt", &["array", "index"], arrays::split_at);
        self.register("arrays.splitWhere", &["array", "function"], arrays::split_where);
        self.register("arrays.sumBy", &["array", "function"], arrays::sum_by);
        self.register("arrays.take", &["array", "index"], arrays::take);
        self.register("arrays.takeWhile", &["array", "function"], arrays::take_while);
    }

    fn register_objects_functions(&mut self) {
        self.register("objects.distinctBy", &["object", "function"], core::distinct_by);
        self.register("objects.divideBy", &["object", "size"], objects::divide_by);
        self.register("objects.everyEntry", &["object", "function"], objects::every_entry);
        self.register("objects.keySet", &["object"], objects::key_set);
        self.register("objects.mergeWith", &["first", "second"], objects::merge_with);
        self.register("objects.someEntry", &["object", "function"], objects::some_entry);
        self.register("objects.takeWhile", &["object", "function"], objects::take_while);
        self.register("objects.valueSet", &["object"], objects::value_set);
    }

    fn register_numbers_functions(&mut self) {
        self.register("numbers.fromBinary", &["value"], numbers::from_binary);
        self.register("numbers.fromHex", &["value"], numbers::from_hex);
        self.register("numbers.fromRadixNumber", &["value", "radix"], numbers::from_radix_number);
        self.register("numbers.toBinary", &["value"], numbers::to_binary);
        self.register("numbers.toHex", &["value"], numbers::to_hex);
        self.register("numbers.toRadixNumber", &["value", "radix"], numbers::to_radix_number);
    }

    fn register_math_functions(&mut self) {
        self.register("math.abs", &["num"], math::abs);
        self.register("math.acos", &["num"], math::acos);
        self.register("math.asin", &["num"], math::asin);
        self.register("math.atan", &["num"], math::atan);
        self.register("math.avg", &["array"], math::avg);
        self.register("math.ceil", &["num"], math::ceil);
        self.register("math.clamp", &["value", "minVal", "maxVal"], math::clamp);
        self.register("math.cos", &["num"], math::cos);
        self.register("math.exp", &["num"], math::exp);
        self.register("math.exponent", &["num"], math::exponent);
        self.register("math.floor", &["num"], math::floor);
        self.register("math.log", &["num"], math::log);
        self.register("math.mantissa", &["num"], math::mantissa);
        self.register("math.mod", &["num1", "num2"], math::modulo);
        self.register("math.pow", &["num1", "num2"], math::pow);
        self.register("math.random", &[], math::random);
        self.register("math.randomInt", &["num"], math::random_int);
        self.register("math.round", &["num"], math::round);
        self.register("math.sin", &["num"], math::sin);
        self.register("math.sqrt", &["num"], math::sqrt);
        self.register("math.sum", &["array"], math::sum);
        self.register("math.tan", &["num"], math::tan);
    }

    fn register_datetime_functions(&mut self) {
        self.register("datetime.atBeginningOfDay", &["datetime"], datetime::at_beginning_of_day);
        self.register("datetime.atBeginningOfHour", &["datetime"], datetime::at_beginning_of_hour);
        self.register("datetime.atBeginningOfMonth", &["datetime"], datetime::at_beginning_of_month);
        self.register("datetime.atBeginningOfWeek", &["datetime"], datetime::at_beginning_of_week);
        self.register("datetime.atBeginningOfYear", &["datetime"], datetime::at_beginning_of_year);
        self.register("datetime.changeTimeZone", &["datetime", "timezone"], datetime::change_time_zone);
        self.register("datetime.compare", &["datetime1", "datetime2"], datetime::compare);
        self.register("datetime.date", &["parts"], datetime::date);
        self.register("datetime.daysBetween", &["datetime1", "datetime2"], datetime::days_between);
        self.register("datetime.format", &["datetime", "outputFormat"], datetime::format);
        self.register("datetime.isLeapYear", &["datetime"], datetime::is_leap_year);
        self.register("datetime.minus", &["datetime", "period"], datetime::minus);
        self.register("datetime.now", &[], datetime::now);
        self.register("datetime.parse", &["datetime", "inputFormat"], datetime::parse);
        self.register("datetime.plus", &["datetime", "period"], datetime::plus);
        self.register("datetime.today", &[], datetime::today);
        self.register("datetime.tomorrow", &[], datetime::tomorrow);
        self.register("datetime.yesterday", &[], datetime::yesterday);
    }

    fn register_period_functions(&mut self) {
        self.register("period.between", &["datetime1", "datetime2"], period::between);
        self.register("period.days", &["num"], period::days);
        self.register("period.duration", &["parts"], period::duration);
        self.register("period.hours", &["num"], period::hours);
        self.register("period.minutes", &["num"], period::minutes);
        self.register("period.months", &["num"], period::months);
        self.register("period.period", &["parts"], period::period);
        self.register("period.seconds", &["num"], period::seconds);
        self.register("period.years", &["num"], period::years);
    }

    fn register_binaries_functions(&mut self) {
        self.register("binaries.fromBase64", &["value"], binaries::from_base64);
        self.register("binaries.fromHex", &["value"], binaries::from_hex);
        self.register("binaries.readLinesWith", &["value", "encoding"], binaries::read_lines_with);
        self.register("binaries.toBase64", &["value"], binaries::to_base64);
        self.register("binaries.toHex", &["value"], binaries::to_hex);
        self.register("binaries.writeLinesWith", &["value", "encoding"], binaries::write_lines_with);
    }

    fn register_crypto_functions(&mut self) {
        self.register("crypto.decrypt", &["value", "secret"], crypto::decrypt);
        self.register("crypto.encrypt", &["value", "secret"], crypto::encrypt);
        self.register("crypto.hash", &["value", "algorithm"], crypto::hash);
        self.register("crypto.hmac", &["value", "secret", "algorithm"], crypto::hmac);
    }

    fn register_url_functions(&mut self) {
        self.register("url.decode", &["data"], url::decode);
        self.register("url.encode", &["data"], url::encode);
    }

    fn register_jsonpath_functions(&mut self) {
        self.register("jsonpath.select", &["object", "path"], jsonpath::select);
    }

    fn register_regex_functions(&mut self) {
        self.register("regex.regexFullMatch", &["expr", "str"], regex::regex_full_match);
        self.register("regex.regexGlobalReplace", &["str", "pattern", "replace"], regex::regex_global_replace);
        self.register("regex.regexPartialMatch", &["expr", "str"], regex::regex_partial_match);
        self.register("regex.regexQuoteMeta", &["str"], regex::regex_quote_meta);
        self.register("regex.regexReplace", &["str", "pattern", "replace"], regex::regex_replace);
        self.register("regex.regexScan", &["expr", "str"], regex::regex_scan);
    }

    fn register_xml_functions(&mut self) {
        self.register("xml.flattenContents", &["element", "params"], xml::flatten_contents);
        self.register("xml.parse", &["data", "params"], xml::parse);
        self.register("xml.toString", &["element", "params"], xml::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_exposes_all_namespaces() {
        let stdlib = StandardLibrary::new();
        for name in [
            "filter",
            "combine",
            "strings.camelize",
            "arrays.outerJoin",
            "objects.mergeWith",
            "numbers.toRadixNumber",
            "math.sqrt",
            "datetime.atBeginningOfWeek",
            "period.between",
            "binaries.toBase64",
            "crypto.hash",
            "url.encode",
            "jsonpath.select",
            "regex.regexScan",
            "xml.parse",
        ] {
            assert!(stdlib.get_function(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_function_count_is_stable() {
        let stdlib = StandardLibrary::new();
        assert!(stdlib.function_names().len() >= 190, "registry shrank: {}", stdlib.function_names().len());
    }

    #[test]
    fn test_functions_are_invocable_through_the_registry() {
        let stdlib = StandardLibrary::new();
        let builtin = stdlib.get_function("strings.ordinalize").unwrap();
        let result = (builtin.func)(&[Value::Num(21.0)]).unwrap();
        assert_eq!(result, Value::string("21st"));
        assert_eq!(builtin.params, &["num"]);
    }
}
