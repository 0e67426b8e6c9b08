use crate::engine::Engine;
use crate::function::Args;

/// Registers the functions the command-line host offers to scripts.
///
/// `print` writes its arguments separated by spaces. `len` sets the result
/// to the number of characters in its argument. `repeat` concatenates a
/// string with itself a given number of times.
pub fn install_host_functions(engine: &mut Engine) {
    engine.register_function("print", |_, args| {
        println!("{}", args.join(" "));
        Ok(())
    });

    engine.register_function("len", |engine, args| {
        let args = Args::new(args);
        args.expect_count(1).map_err(|e| format!("len: {}", e))?;
        let text = args.string(0)?;
        engine.set_result(text.chars().count().to_string());
        Ok(())
    });

    engine.register_function("repeat", |engine, args| {
        let args = Args::new(args);
        args.expect_count(2).map_err(|e| format!("repeat: {}", e))?;
        let text = args.string(0)?;
        let times = usize::try_from(args.integer(1)?).unwrap_or(0);
        engine.set_result(text.repeat(times));
        Ok(())
    });
}

/// Runs a whole script in a fresh engine and returns its result, reporting
/// any error on stderr.
pub fn run(source: &str, filename: Option<&str>) -> Option<String> {
    let mut engine = Engine::new();
    install_host_functions(&mut engine);

    match engine.evaluate(source) {
        Ok(result) => Some(result),
        Err(error) => {
            if error.report(source, filename).is_err() {
                eprint!("{}", engine.error().unwrap_or_default());
            }
            None
        }
    }
}
