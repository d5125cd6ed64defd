//! Shell hook generation
//!
//! `argcomp register` prints a snippet that, when evaluated by the shell,
//! routes tab completion for a program through its interceptor. The hook sets
//! the request environment, runs the program with its real output silenced
//! and reads candidates back from the response channel.

use std::path::PathBuf;

use crate::shell::{
    ENV_DFS, ENV_IFS, ENV_LINE, ENV_POINT, ENV_REQUEST, ENV_SHELL, ENV_STDOUT_FILENAME,
    ENV_SUPPRESS_SPACE, ENV_WORDBREAKS, ShellKind,
};

/// Environment variable naming a JSON spec for programs without an interceptor
pub const ENV_SPEC_FILE: &str = "_ARGCOMP_SPEC_FILE";

/// What to register and how
#[derive(Debug, Clone)]
pub struct HookOptions {
    /// Command name the shell completes
    pub program: String,
    pub shell: ShellKind,
    /// JSON spec answered by `executable` instead of the program itself
    pub spec_file: Option<PathBuf>,
    /// Binary that answers requests when `spec_file` is set
    pub executable: String,
}

impl HookOptions {
    pub fn new(program: impl Into<String>, shell: ShellKind) -> Self {
        Self {
            program: program.into(),
            shell,
            spec_file: None,
            executable: "argcomp".to_string(),
        }
    }

    pub fn spec_file(mut self, path: impl Into<PathBuf>, executable: impl Into<String>) -> Self {
        self.spec_file = Some(path.into());
        self.executable = executable.into();
        self
    }

    /// Identifier-safe form of the program name
    fn function_name(&self) -> String {
        let sanitized: String = self
            .program
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("_argcomp_{sanitized}")
    }
}

/// Generate the hook for one program
///
/// # Arguments
/// * `options` - Program, shell and optional spec file
///
/// # Returns
/// * `String` - Snippet to evaluate in the target shell
pub fn generate_hook(options: &HookOptions) -> String {
    tracing::debug!("Generating {} hook for {}", options.shell, options.program);
    match options.shell {
        ShellKind::Bash => bash_hook(options),
        ShellKind::Zsh => zsh_hook(options),
        ShellKind::Tcsh => tcsh_hook(options),
        ShellKind::Fish => fish_hook(options),
        ShellKind::PowerShell => powershell_hook(options),
    }
}

/// Quote a word for POSIX shells
fn single_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// `VAR=value ` prefix and command for POSIX-style hooks
fn posix_invocation(options: &HookOptions, program_arg: &str) -> (String, String) {
    match &options.spec_file {
        Some(path) => (
            format!(
                "{ENV_SPEC_FILE}={} ",
                single_quote(&path.display().to_string())
            ),
            single_quote(&options.executable),
        ),
        None => (String::new(), program_arg.to_string()),
    }
}

fn bash_hook(options: &HookOptions) -> String {
    let function = options.function_name();
    let program = single_quote(&options.program);
    let (spec_env, command) = posix_invocation(options, "\"$1\"");

    format!(
        r#"# argcomp hook for {name} (bash)
{function}() {{
    local IFS=$'\013'
    local SUPPRESS_SPACE=0
    if compopt +o nospace 2> /dev/null; then
        SUPPRESS_SPACE=1
    fi
    COMPREPLY=( $({ENV_LINE}="$COMP_LINE" \
                  {ENV_POINT}="$COMP_POINT" \
                  {ENV_WORDBREAKS}="$COMP_WORDBREAKS" \
                  {ENV_REQUEST}=1 \
                  {ENV_SHELL}=bash \
                  {ENV_SUPPRESS_SPACE}=$SUPPRESS_SPACE \
                  {spec_env}{command} 8>&1 1>/dev/null) )
    if [[ $? != 0 ]]; then
        unset COMPREPLY
    elif [[ $SUPPRESS_SPACE == 1 ]] && [[ "${{COMPREPLY-}}" =~ [=/:]$ ]]; then
        compopt -o nospace
    fi
}}
complete -o nospace -o default -o bashdefault -F {function} {program}
"#,
        name = options.program,
    )
}

fn zsh_hook(options: &HookOptions) -> String {
    let function = options.function_name();
    let program = single_quote(&options.program);
    let (spec_env, command) = posix_invocation(options, "\"${words[1]}\"");

    format!(
        r#"# argcomp hook for {name} (zsh)
{function}() {{
    local -a completions suffix
    local point
    () {{ setopt localoptions nomultibyte; point=${{#LBUFFER}} }}
    completions=( ${{(ps:\013:)"$({ENV_LINE}="$BUFFER" \
        {ENV_POINT}="$point" \
        {ENV_REQUEST}=1 \
        {ENV_SHELL}=zsh \
        {ENV_IFS}=$'\013' \
        {ENV_DFS}=: \
        {ENV_SUPPRESS_SPACE}=1 \
        {spec_env}{command} 8>&1 1>/dev/null)"}} )
    if [[ -n "${{completions[*]}}" ]]; then
        if (( ${{#completions}} == 1 )) && [[ "${{completions[1]%%:*}}" == *[=/] ]]; then
            suffix=(-S '')
        fi
        _describe {program} completions -o nosort $suffix
    else
        _files
    fi
}}
compdef {function} {program}
"#,
        name = options.program,
    )
}

fn tcsh_hook(options: &HookOptions) -> String {
    let program = single_quote(&options.program);
    let (spec_env, command) = posix_invocation(options, &program);

    format!(
        r#"# argcomp hook for {name} (tcsh)
complete {program} 'p@*@`env {ENV_REQUEST}=1 {ENV_SHELL}=tcsh {spec_env}{command}`@' ;
"#,
        name = options.program,
    )
}

fn fish_hook(options: &HookOptions) -> String {
    let function = format!("_{}", options.function_name());
    let program = single_quote(&options.program);
    let spec_env = match &options.spec_file {
        Some(path) => format!(
            "    set -lx {ENV_SPEC_FILE} {}\n",
            single_quote(&path.display().to_string())
        ),
        None => String::new(),
    };
    let command = match &options.spec_file {
        Some(_) => single_quote(&options.executable),
        None => program.clone(),
    };

    format!(
        r#"# argcomp hook for {name} (fish)
function {function}
    set -lx {ENV_REQUEST} 1
    set -lx {ENV_SHELL} fish
    set -lx {ENV_IFS} \n
    set -lx {ENV_DFS} \t
    set -lx {ENV_LINE} (commandline -p)
    set -lx {ENV_POINT} (math (commandline -cp | wc -c) - 1)
{spec_env}    {command} 8>&1 1>/dev/null
end
complete --command {program} -f -a '({function})'
"#,
        name = options.program,
    )
}

fn powershell_hook(options: &HookOptions) -> String {
    let quote = |s: &str| format!("'{}'", s.replace('\'', "''"));
    let program = quote(&options.program);
    let (spec_env, command, cleanup) = match &options.spec_file {
        Some(path) => (
            format!(
                "    $env:{ENV_SPEC_FILE} = {}\n",
                quote(&path.display().to_string())
            ),
            quote(&options.executable),
            format!(", Env:\\{ENV_SPEC_FILE}"),
        ),
        None => (String::new(), program.clone(), String::new()),
    };

    format!(
        r#"# argcomp hook for {name} (powershell)
Register-ArgumentCompleter -Native -CommandName {program} -ScriptBlock {{
    param($wordToComplete, $commandAst, $cursorPosition)
    $completionFile = New-TemporaryFile
    $env:{ENV_REQUEST} = 1
    $env:{ENV_SHELL} = "powershell"
    $env:{ENV_STDOUT_FILENAME} = $completionFile
    $line = $commandAst.ToString()
    $offset = [Math]::Max(0, [Math]::Min($cursorPosition - $commandAst.Extent.StartOffset, $line.Length))
    $env:{ENV_LINE} = $line
    $env:{ENV_POINT} = [System.Text.Encoding]::UTF8.GetByteCount($line.Substring(0, $offset))
{spec_env}    & {command} 2>&1 | Out-Null
    Get-Content $completionFile | ForEach-Object {{
        [System.Management.Automation.CompletionResult]::new($_, $_, "ParameterValue", $_)
    }}
    Remove-Item $completionFile, Env:\{ENV_REQUEST}, Env:\{ENV_SHELL}, Env:\{ENV_STDOUT_FILENAME}, Env:\{ENV_LINE}, Env:\{ENV_POINT}{cleanup}
}}
"#,
        name = options.program,
    )
}
